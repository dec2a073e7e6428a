//! Per-philosopher state.

use crate::error::CoreError;
use crate::ring::{neighbor, Seat};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// 1-based philosopher number, as printed in every announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhilosopherId(u32);

impl PhilosopherId {
    /// Identity of the philosopher sitting at 0-based `index`.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// Creates an id from its printed 1-based number.
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Self(number))
    }

    /// The printed number.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// 0-based seat index.
    pub fn index(&self) -> usize {
        self.0 as usize - 1
    }

    /// True for even printed numbers, which grab their right fork first.
    pub fn is_even(&self) -> bool {
        self.0 % 2 == 0
    }
}

impl std::fmt::Display for PhilosopherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Meal bookkeeping guarded by the philosopher's own lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MealLog {
    /// Completed meals
    pub meals: u32,

    /// Clock reading of the latest meal start; None before the first one
    pub last_meal: Option<Duration>,
}

/// One philosopher: identity, seat and meal log.
///
/// The meal log is written only by the philosopher itself and read by the
/// monitor, behind a lock that is never held together with a fork.
#[derive(Debug)]
pub struct Philosopher {
    /// Printed identity
    id: PhilosopherId,

    /// Fork indices this philosopher needs
    seat: Seat,

    /// Meals and last meal time
    log: Mutex<MealLog>,
}

impl Philosopher {
    /// Seats the philosopher at `index` of a table of `count`.
    pub fn seat_at_table(index: usize, count: usize) -> Self {
        Self {
            id: PhilosopherId::from_index(index),
            seat: Seat {
                left: index,
                right: neighbor(index, count),
            },
            log: Mutex::new(MealLog::default()),
        }
    }

    /// Returns the philosopher's identity.
    pub fn id(&self) -> PhilosopherId {
        self.id
    }

    /// Returns the fork indices this philosopher uses.
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Seeds the last meal with the simulation start, so the deadline runs
    /// from launch.
    pub fn mark_launched(&self, start: Duration) -> Result<(), CoreError> {
        self.lock()?.last_meal = Some(start);
        Ok(())
    }

    /// Starts a meal at `now`, publishing it through `announce` while the
    /// log is locked. A watcher sees the new deadline and the announcement
    /// together or not at all.
    ///
    /// Returns false, recording nothing, when `announce` did not publish.
    pub fn start_meal<F>(&self, now: Duration, announce: F) -> Result<bool, CoreError>
    where
        F: FnOnce() -> Result<bool, CoreError>,
    {
        let mut log = self.lock()?;
        if !announce()? {
            return Ok(false);
        }
        log.last_meal = Some(now);
        Ok(true)
    }

    /// Counts a finished meal and returns the new total.
    pub fn finish_meal(&self) -> Result<u32, CoreError> {
        let mut log = self.lock()?;
        log.meals += 1;
        Ok(log.meals)
    }

    /// Returns a consistent copy of the meal log.
    pub fn snapshot(&self) -> Result<MealLog, CoreError> {
        Ok(*self.lock()?)
    }

    /// Runs `f` on the log with the lock held. No meal can start meanwhile.
    pub fn with_log<R, F>(&self, f: F) -> Result<R, CoreError>
    where
        F: FnOnce(&MealLog) -> Result<R, CoreError>,
    {
        let log = self.lock()?;
        f(&log)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MealLog>, CoreError> {
        self.log.lock().map_err(|_| CoreError::Poisoned("meal log"))
    }
}
