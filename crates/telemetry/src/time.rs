// Path: crates/telemetry/src/time.rs
use std::time::Instant;

/// A simple RAII timer that reports the elapsed duration, in seconds, to a
/// callback when dropped. Used to wrap dispatch latency observations without
/// needing a matching `end()` call on every return path.
pub struct Timer<F: FnMut(f64)> {
    on_drop: F,
    start: Instant,
}

impl<F: FnMut(f64)> Timer<F> {
    pub fn new(on_drop: F) -> Self {
        Self {
            on_drop,
            start: Instant::now(),
        }
    }
}

impl<F: FnMut(f64)> Drop for Timer<F> {
    fn drop(&mut self) {
        (self.on_drop)(self.start.elapsed().as_secs_f64());
    }
}
