//! Search control: stop flag and time budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable handle for requesting that a running search stop.
///
/// Stopping is sticky: once set, the flag stays set for the lifetime of the
/// handle. Each search should get a fresh handle.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create an unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the search to unwind.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Controls when a search should stop.
///
/// Consulted at the top of every search node and before each new
/// iterative-deepening depth. Two modes:
/// - **Infinite**: no time pressure, only responds to the stop flag
/// - **Timed**: the budget clock starts at construction
pub struct SearchControl {
    stop: StopHandle,
    start: Instant,
    budget: Option<Duration>,
}

impl SearchControl {
    /// Control without a time limit.
    pub fn new_infinite(stop: &StopHandle) -> Self {
        Self {
            stop: stop.clone(),
            start: Instant::now(),
            budget: None,
        }
    }

    /// Control with a time budget; a zero budget means no limit.
    pub fn new_timed(stop: &StopHandle, budget: Duration) -> Self {
        Self {
            stop: stop.clone(),
            start: Instant::now(),
            budget: (!budget.is_zero()).then_some(budget),
        }
    }

    /// Check whether the search should abort immediately.
    ///
    /// When the budget runs out the stop flag is set, so the answer never
    /// flips back to `false` for the rest of the search.
    pub fn should_stop(&self) -> bool {
        if self.stop.is_stopped() {
            return true;
        }

        if let Some(budget) = self.budget
            && self.start.elapsed() >= budget
        {
            self.stop.stop();
            return true;
        }

        false
    }

    /// Whether the flag has been tripped, without consulting the clock.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The time budget, if any.
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_control_never_times_out() {
        let stop = StopHandle::new();
        let control = SearchControl::new_infinite(&stop);
        assert!(!control.should_stop());
        assert_eq!(control.budget(), None);
    }

    #[test]
    fn zero_budget_means_unlimited() {
        let stop = StopHandle::new();
        let control = SearchControl::new_timed(&stop, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(!control.should_stop());
    }

    #[test]
    fn external_stop_is_observed() {
        let stop = StopHandle::new();
        let control = SearchControl::new_infinite(&stop);
        stop.clone().stop();
        assert!(control.should_stop());
        assert!(control.is_stopped());
    }

    #[test]
    fn expired_budget_trips_flag() {
        let stop = StopHandle::new();
        let control = SearchControl::new_timed(&stop, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!control.is_stopped(), "flag is only tripped when polled");
        assert!(control.should_stop());
        assert!(stop.is_stopped(), "timeout is sticky");
    }
}
