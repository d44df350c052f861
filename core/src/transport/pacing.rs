// Pacing — the single suspension point between polls
//
// Every bounded wait in the engine is "poll, then pause for one interval".
// Retry budgets stay data (attempt counts); how a pause is spent belongs
// to the pacer.

use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
pub trait Pacer {
    /// Suspend the caller for `interval`
    fn pause(&mut self, interval: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
}

/// Returns immediately; counts pauses for inspection
#[derive(Debug, Clone, Default)]
pub struct InstantPacer {
    pauses: usize,
    total: Duration,
}

impl InstantPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }

    /// Time that would have elapsed under a real pacer
    pub fn simulated_elapsed(&self) -> Duration {
        self.total
    }
}

impl Pacer for InstantPacer {
    fn pause(&mut self, interval: Duration) {
        self.pauses += 1;
        self.total += interval;
    }
}
