//! The contents of this crate need to be organized better:
//!
//! - Timer (a mix of logging, profiling, and even parallel execution)
//! - number formatting
//! - OSM-style key/value tags
//! - JSON helpers

#[macro_use]
extern crate log;

pub mod logger;
mod serde;
mod tags;
mod time;
mod utils;

pub use crate::serde::{deserialize_btreemap, from_json, serialize_btreemap, to_json};
pub use crate::tags::Tags;
pub use crate::time::Timer;
pub use crate::utils::prettyprint_usize;

const PROGRESS_FREQUENCY_SECONDS: f64 = 0.2;
