use instant::Instant;

use crate::{prettyprint_usize, PROGRESS_FREQUENCY_SECONDS};

fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

struct Progress {
    label: String,
    processed_items: usize,
    total_items: usize,
    started_at: Instant,
    last_printed_at: Instant,
}

impl Progress {
    fn new(label: String, total_items: usize) -> Progress {
        Progress {
            label,
            processed_items: 0,
            total_items,
            started_at: Instant::now(),
            last_printed_at: Instant::now(),
        }
    }

    // Returns when done
    fn next(&mut self) -> Option<(f64, String)> {
        self.processed_items += 1;
        if self.processed_items > self.total_items {
            panic!(
                "{} is too few items for {} progress",
                prettyprint_usize(self.total_items),
                self.label
            );
        }

        if self.processed_items == self.total_items {
            let elapsed = elapsed_seconds(self.started_at);
            let line = format!(
                "{} ({})... {}",
                self.label,
                prettyprint_usize(self.total_items),
                prettyprint_time(elapsed)
            );
            debug!("{}", line);
            return Some((elapsed, line));
        } else if elapsed_seconds(self.last_printed_at) >= PROGRESS_FREQUENCY_SECONDS {
            self.last_printed_at = Instant::now();
            debug!(
                "{}: {}/{}... {}",
                self.label,
                prettyprint_usize(self.processed_items),
                prettyprint_usize(self.total_items),
                prettyprint_time(elapsed_seconds(self.started_at))
            );
        }
        None
    }
}

enum StackEntry {
    TimerSpan(TimerSpan),
    Progress(Progress),
}

struct TimerSpan {
    name: String,
    started_at: Instant,
    nested_results: Vec<String>,
    nested_time: f64,
}

/// Hierarchial magic. Spans are started and stopped by name, progress over a known number of
/// items is tracked with `start_iter` and `next`, and everything is summarized when the Timer is
/// dropped.
pub struct Timer {
    results: Vec<String>,
    stack: Vec<StackEntry>,

    outermost_name: String,

    notes: Vec<String>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new<I: Into<String>>(raw_name: I) -> Timer {
        let name = raw_name.into();
        let mut t = Timer {
            results: Vec::new(),
            stack: Vec::new(),
            outermost_name: name.clone(),
            notes: Vec::new(),
            warnings: Vec::new(),
        };
        t.start(name);
        t
    }

    /// For tests and callers that don't care about the summary.
    pub fn throwaway() -> Timer {
        Timer::new("throwaway")
    }

    /// Log immediately, but also repeat at the end, to avoid having to scroll up and find
    /// interesting debug stuff.
    pub fn note<I: Into<String>>(&mut self, raw_line: I) {
        let line = raw_line.into();
        info!("{}", line);
        self.notes.push(line);
    }

    /// Only log at the end.
    pub fn warn<I: Into<String>>(&mut self, raw_line: I) {
        self.warnings.push(raw_line.into());
    }

    pub fn num_warnings(&self) -> usize {
        self.warnings.len()
    }

    pub fn start<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        info!("{}...", name);
        self.stack.push(StackEntry::TimerSpan(TimerSpan {
            name,
            started_at: Instant::now(),
            nested_results: Vec::new(),
            nested_time: 0.0,
        }));
    }

    pub fn stop<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        let span = match self.stack.pop() {
            Some(StackEntry::TimerSpan(s)) => s,
            _ => panic!("stop({}) while something else is top of the stack", name),
        };
        assert_eq!(span.name, name);
        let elapsed = elapsed_seconds(span.started_at);
        let line = format!("{} took {}", name, prettyprint_time(elapsed));

        let padding = "  ".repeat(self.stack.len());
        match self.stack.last_mut() {
            Some(StackEntry::TimerSpan(ref mut s)) => {
                s.nested_results.push(format!("{}- {}", padding, line));
                s.nested_results.extend(span.nested_results);
                if span.nested_time != 0.0 {
                    s.nested_results.push(format!(
                        "  {}- {} unaccounted",
                        padding,
                        prettyprint_time(elapsed - span.nested_time)
                    ));
                }
                s.nested_time += elapsed;
            }
            Some(_) => unreachable!(),
            None => {
                self.results.push(format!("{}- {}", padding, line));
                self.results.extend(span.nested_results);
            }
        }

        info!("{}", line);
    }

    pub fn start_iter<I: Into<String>>(&mut self, raw_name: I, total_items: usize) {
        if total_items == 0 {
            return;
        }
        let name = raw_name.into();
        if let Some(StackEntry::Progress(p)) = self.stack.last() {
            panic!(
                "Can't start_iter({}) while Progress({}) is top of the stack",
                name, p.label
            );
        }

        self.stack
            .push(StackEntry::Progress(Progress::new(name, total_items)));
    }

    pub fn next(&mut self) {
        let maybe_result =
            if let Some(StackEntry::Progress(ref mut progress)) = self.stack.last_mut() {
                progress.next()
            } else {
                panic!("Can't next() while a TimerSpan is top of the stack");
            };
        if let Some((elapsed, result)) = maybe_result {
            self.stack.pop();
            self.add_result(elapsed, result);
        }
    }

    fn add_result(&mut self, elapsed: f64, line: String) {
        let padding = "  ".repeat(self.stack.len());
        match self.stack.last_mut() {
            Some(StackEntry::TimerSpan(ref mut s)) => {
                s.nested_results.push(format!("{}- {}", padding, line));
                s.nested_time += elapsed;
            }
            Some(_) => unreachable!(),
            None => {
                self.results.push(format!("{}- {}", padding, line));
            }
        }
    }

    /// Run `cb` over every request on a pool of worker threads. The results come back in the same
    /// order as the requests.
    pub fn parallelize<I, O, F: Fn(I) -> O>(
        &mut self,
        timer_name: &str,
        requests: Vec<I>,
        cb: F,
    ) -> Vec<O>
    where
        I: Send,
        O: Send,
        F: Send + Clone + Copy,
    {
        scoped_threadpool::Pool::new(num_cpus::get() as u32).scoped(|scope| {
            let (tx, rx) = std::sync::mpsc::channel();
            let mut results: Vec<Option<O>> = std::iter::repeat_with(|| None)
                .take(requests.len())
                .collect();
            for (idx, req) in requests.into_iter().enumerate() {
                let tx = tx.clone();
                scope.execute(move || {
                    // If the receiver is gone, the main thread already panicked
                    let _ = tx.send((idx, cb(req)));
                });
            }
            drop(tx);

            self.start_iter(timer_name, results.len());
            for (idx, result) in rx.iter() {
                self.next();
                results[idx] = Some(result);
            }
            results
                .into_iter()
                .map(|x| x.expect("a parallelize worker died"))
                .collect()
        })
    }
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        let stop_name = self.outermost_name.clone();

        // If we're in the middle of unwinding a panic, don't further blow up.
        match self.stack.last() {
            Some(StackEntry::TimerSpan(ref s)) => {
                if s.name != stop_name {
                    error!("dropping Timer during {}, due to panic?", s.name);
                    return;
                }
            }
            Some(StackEntry::Progress(ref p)) => {
                error!("dropping Timer while doing progress {}, due to panic?", p.label);
                return;
            }
            None => unreachable!(),
        }

        self.stop(stop_name);
        assert!(self.stack.is_empty());
        for line in &self.results {
            info!("{}", line);
        }

        if !self.notes.is_empty() {
            info!("{} notes:", self.notes.len());
            for line in &self.notes {
                info!("{}", line);
            }
        }

        if !self.warnings.is_empty() {
            warn!("{} warnings:", self.warnings.len());
            for line in &self.warnings {
                warn!("{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelize_keeps_order() {
        let mut timer = Timer::new("test");
        let requests: Vec<usize> = (0..100).collect();
        let results = timer.parallelize("square", requests, |x| x * x);
        assert_eq!(results.len(), 100);
        assert_eq!(results[7], 49);
        assert_eq!(results[99], 99 * 99);
    }

    #[test]
    fn nested_spans() {
        let mut timer = Timer::new("outer");
        timer.start("inner");
        timer.start_iter("items", 3);
        for _ in 0..3 {
            timer.next();
        }
        timer.stop("inner");
        timer.warn("something odd");
        assert_eq!(timer.num_warnings(), 1);
    }
}
