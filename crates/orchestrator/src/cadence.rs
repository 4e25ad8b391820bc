//! Polling cadence control.

use std::time::Duration;

use crate::config::TimingConfig;

/// Picks the scoreboard poll interval for the next cycle.
///
/// Fast while a sequence is in flight or the break timer is inside the
/// hot window (a transition is imminent), slow otherwise to bound
/// scrape load.
#[derive(Debug, Clone)]
pub struct CadenceGovernor {
    fast: Duration,
    slow: Duration,
    hot_window_secs: u32,
}

impl CadenceGovernor {
    pub fn new(timings: &TimingConfig) -> Self {
        Self {
            fast: timings.fast_poll(),
            slow: timings.slow_poll(),
            hot_window_secs: timings.break_hot_window_secs,
        }
    }

    pub fn interval(&self, sequence_active: bool, break_timer: Option<u32>) -> Duration {
        if sequence_active {
            return self.fast;
        }
        if break_timer.is_some_and(|b| b <= self.hot_window_secs) {
            return self.fast;
        }
        self.slow
    }
}
