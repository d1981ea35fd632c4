//! Scoped wall-clock timer for generation phases.

use std::time::{Duration, Instant};

/// Logs how long a phase took when dropped.
///
/// ```
/// let _t = weft_common::ScopedTimer::new("Build switch blocks");
/// // ... work ...
/// // drop logs "Build switch blocks took 1.2ms" at info level
/// ```
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
}

impl ScopedTimer {
    /// Starts a timer for the named phase and logs that it started.
    pub fn new(name: &'static str) -> Self {
        log::debug!("{name}...");
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Time elapsed since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::info!("{} took {:?}", self.name, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let t = ScopedTimer::new("test phase");
        let a = t.elapsed();
        let b = t.elapsed();
        assert!(b >= a);
    }
}
