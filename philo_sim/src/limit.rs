//! Wall-clock limit for a run.
//!
//! An unbounded table never ends on its own, so survival can only be shown
//! by outliving a deadline.

use crate::error::SimError;
use philo_core::{nap, SleepOutcome, StopFlag};
use philo_env::MonotonicClock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Stops the run once a fixed time has passed.
#[derive(Debug)]
pub struct TimeLimit {
    /// Set before the stop flag, and only if nothing else stopped the run
    reached: Arc<AtomicBool>,
}

impl TimeLimit {
    /// Starts the timer thread. It gives up quietly once `stop` is set by
    /// anyone else.
    pub fn start(stop: Arc<StopFlag>, limit: Duration) -> Result<Self, SimError> {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        thread::Builder::new()
            .name("time-limit".to_string())
            .spawn(move || {
                let clock = MonotonicClock::new();
                if nap(&clock, limit, &stop) == SleepOutcome::Completed && !stop.observe() {
                    info!(limit_ms = limit.as_millis() as u64, "time limit reached");
                    flag.store(true, Ordering::Release);
                    stop.trigger();
                }
            })
            .map_err(SimError::Timer)?;
        Ok(Self { reached })
    }

    /// True if the limit is what stopped the run.
    pub fn reached(&self) -> bool {
        self.reached.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_limit_stops_the_run() {
        let stop = Arc::new(StopFlag::new());
        let limit = TimeLimit::start(Arc::clone(&stop), Duration::from_millis(50)).unwrap();
        let started = Instant::now();

        while !stop.observe() {
            assert!(started.elapsed() < Duration::from_secs(5), "limit never fired");
            thread::sleep(Duration::from_millis(1));
        }

        assert!(limit.reached());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_earlier_stop_is_not_the_limit() {
        let stop = Arc::new(StopFlag::new());
        let limit = TimeLimit::start(Arc::clone(&stop), Duration::from_millis(20)).unwrap();

        stop.trigger();
        thread::sleep(Duration::from_millis(60));

        assert!(!limit.reached());
    }
}
