//! Manual clock for deterministic tests.

use crate::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Virtual clock that only moves when told to.
///
/// - `pause` advances the virtual time instead of sleeping
/// - `advance` and `set` move it explicitly
/// - Clones share one timeline, so a clone handed to a philosopher and the
///   one kept by the test always agree
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current virtual time (nanoseconds since the clock's origin)
    virtual_time_ns: Arc<Mutex<u64>>,
}

impl ManualClock {
    /// Creates a new ManualClock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock already positioned at `at`.
    pub fn starting_at(at: Duration) -> Self {
        let clock = Self::new();
        clock.set(at);
        clock
    }

    /// Advances virtual time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .virtual_time_ns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *time += duration.as_nanos() as u64;
    }

    /// Sets the virtual time to a specific value.
    pub fn set(&self, at: Duration) {
        let mut time = self
            .virtual_time_ns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *time = at.as_nanos() as u64;
    }
}

impl Clone for ManualClock {
    fn clone(&self) -> Self {
        Self {
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let time = self
            .virtual_time_ns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Duration::from_nanos(*time)
    }

    fn pause(&self, duration: Duration) {
        self.advance(duration);
    }
}
