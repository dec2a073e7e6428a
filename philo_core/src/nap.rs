//! Interruptible timed delays.
//!
//! A delay is spent in slices of half the remaining time, never shorter
//! than [`MIN_SLICE`], re-checking the abort condition between slices. The
//! overshoot past the deadline or past a stop signal is therefore bounded by
//! one slice.

use crate::stop::StopFlag;
use philo_env::Clock;
use std::time::Duration;

/// Shortest slice slept between two abort checks.
pub const MIN_SLICE: Duration = Duration::from_micros(100);

/// How a timed delay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The deadline was reached
    Completed,
    /// `should_abort` returned true first
    Aborted,
}

/// Sleeps until `deadline` (a `clock.now()` reading) or until `should_abort`
/// returns true.
pub fn sleep_until<C, F>(clock: &C, deadline: Duration, should_abort: F) -> SleepOutcome
where
    C: Clock + ?Sized,
    F: Fn() -> bool,
{
    loop {
        if should_abort() {
            return SleepOutcome::Aborted;
        }
        let now = clock.now();
        if now >= deadline {
            return SleepOutcome::Completed;
        }
        clock.pause(slice_for(deadline - now));
    }
}

/// Sleeps for `duration` unless `stop` is triggered first.
pub fn nap<C: Clock + ?Sized>(clock: &C, duration: Duration, stop: &StopFlag) -> SleepOutcome {
    let deadline = clock.now() + duration;
    sleep_until(clock, deadline, || stop.observe())
}

fn slice_for(remaining: Duration) -> Duration {
    if remaining > Duration::from_millis(1) {
        remaining / 2
    } else {
        MIN_SLICE.min(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use philo_env::{ManualClock, MonotonicClock};
    use std::cell::Cell;

    #[test]
    fn test_sleep_completes_at_deadline() {
        let clock = ManualClock::new();
        let stop = StopFlag::new();

        let outcome = nap(&clock, Duration::from_millis(200), &stop);

        assert_eq!(outcome, SleepOutcome::Completed);
        assert_eq!(clock.now(), Duration::from_millis(200));
    }

    #[test]
    fn test_sleep_aborts_immediately_when_stopped() {
        let clock = ManualClock::new();
        let stop = StopFlag::new();
        stop.trigger();

        assert_eq!(nap(&clock, Duration::from_secs(10), &stop), SleepOutcome::Aborted);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_abort_observed_within_one_slice() {
        let clock = ManualClock::new();
        let checks = Cell::new(0u32);

        let outcome = sleep_until(&clock, Duration::from_millis(100), || {
            checks.set(checks.get() + 1);
            clock.now() >= Duration::from_millis(60)
        });

        assert_eq!(outcome, SleepOutcome::Aborted);
        // 50 + 25 = 75 ms: the first slice boundary past the 60 ms abort.
        assert_eq!(clock.now(), Duration::from_millis(75));
        assert_eq!(checks.get(), 3);
    }

    #[test]
    fn test_slices_halve_then_floor() {
        assert_eq!(slice_for(Duration::from_millis(100)), Duration::from_millis(50));
        assert_eq!(slice_for(Duration::from_millis(1)), MIN_SLICE);
        assert_eq!(slice_for(Duration::from_micros(30)), Duration::from_micros(30));
    }

    #[test]
    fn test_real_sleep_overshoot_is_small() {
        let clock = MonotonicClock::new();
        let stop = StopFlag::new();
        let start = clock.now();

        nap(&clock, Duration::from_millis(50), &stop);
        let spent = clock.now() - start;

        assert!(spent >= Duration::from_millis(50));
        assert!(spent < Duration::from_millis(75), "overslept: {spent:?}");
    }
}
