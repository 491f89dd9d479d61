/// Intercept messages using the `log` crate and print them to STDOUT. Defaults to `info`, but
/// `RUST_LOG` overrides that.
pub fn setup() {
    use env_logger::{Builder, Env};
    // Tests and tools may both try to set this up; only the first one wins.
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
