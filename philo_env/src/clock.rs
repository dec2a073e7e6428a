//! Time source shared by philosophers, heralds and monitors.

use std::time::Duration;

/// The central interface for reading and spending time.
///
/// Abstracts the "real world" clock so the coordination engine can run
/// against the system monotonic clock in production and against a manual,
/// virtual clock in tests.
///
/// # Implementations
///
/// - **Production**: `MonotonicClock` - wraps `CLOCK_MONOTONIC`
/// - **Tests**: `ManualClock` - virtual time that only moves when told to
pub trait Clock: Send + Sync + 'static {
    /// Returns the current monotonic time.
    ///
    /// The origin is implementation defined but fixed, so two readings can
    /// be subtracted. For `MonotonicClock` the origin is shared by every
    /// process on the host, which lets a launcher hand its start timestamp
    /// to child processes.
    fn now(&self) -> Duration;

    /// Suspends the caller for the given duration.
    ///
    /// In production this blocks the calling thread.
    /// In tests it advances virtual time.
    fn pause(&self, duration: Duration);

    /// Whole milliseconds elapsed since `since`, saturating at zero.
    fn elapsed_ms(&self, since: Duration) -> u64 {
        self.now().saturating_sub(since).as_millis() as u64
    }
}

/// Production clock backed by the system-wide monotonic clock.
///
/// `std::time::Instant` is opaque and cannot cross a process boundary, so the
/// raw `CLOCK_MONOTONIC` reading is used instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Creates a new MonotonicClock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[cfg(unix)]
    fn now(&self) -> Duration {
        // SAFETY: an all-zero timespec is a valid value, `ts` is writable and
        // CLOCK_MONOTONIC is always supported, so the call cannot fail.
        let ts = unsafe {
            let mut ts: libc::timespec = std::mem::zeroed();
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
            ts
        };
        Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
    }

    #[cfg(not(unix))]
    fn now(&self) -> Duration {
        use std::sync::OnceLock;
        use std::time::Instant;

        static ORIGIN: OnceLock<Instant> = OnceLock::new();
        ORIGIN.get_or_init(Instant::now).elapsed()
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let t1 = clock.now();
        clock.pause(Duration::from_millis(10));
        let t2 = clock.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[test]
    fn test_elapsed_ms_saturates() {
        let clock = MonotonicClock::new();
        let future = clock.now() + Duration::from_secs(60);

        assert_eq!(clock.elapsed_ms(future), 0);
    }

    #[test]
    fn test_clock_shared_across_threads() {
        let clock = MonotonicClock::new();
        let before = clock.now();
        let seen = std::thread::spawn(move || clock.now()).join().unwrap();

        assert!(seen >= before);
    }
}
