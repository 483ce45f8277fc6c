use std::time::{Duration, Instant};

use log::trace;

/// Runs `f`, returning how long it took alongside its result.
pub fn time_it<R>(label: &str, f: impl FnOnce() -> R) -> (Duration, R) {
    trace!("begin {}", label);
    let before = Instant::now();
    let result = f();
    let elapsed = before.elapsed();
    trace!("end {} ({:?})", label, elapsed);
    (elapsed, result)
}
