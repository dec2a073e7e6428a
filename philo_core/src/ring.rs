//! The ring of forks.
//!
//! Philosopher `i` sits between fork `i` (its left) and fork
//! `neighbor(i, n)` (its right). A table of one has a single fork that is
//! both.

use crate::error::CoreError;
use crate::philosopher::PhilosopherId;
use philo_env::{CountingSemaphore, EnvError};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Marker stored in `holders` for a fork nobody holds.
const FREE: usize = 0;

/// Index of the seat to the right of `index` on a table of `count`.
pub fn neighbor(index: usize, count: usize) -> usize {
    (index + 1) % count
}

/// Which of a philosopher's two forks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Fork at the philosopher's own index
    Left,
    /// Fork at the next index
    Right,
}

/// Fork indices of one philosopher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub left: usize,
    pub right: usize,
}

impl Seat {
    /// Fork index on the given side.
    pub fn fork(&self, side: Side) -> usize {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Fixed-size ring of exclusive forks.
///
/// Every fork is a binary counting semaphore. The ring also records who
/// holds each fork, so an acquisition that lands on a fork still recorded
/// as held is reported instead of silently breaking mutual exclusion.
pub struct ForkRing<S> {
    /// One semaphore per seat
    forks: Vec<S>,

    /// Printed number of the current holder, or `FREE`
    holders: Vec<AtomicUsize>,
}

impl<S: CountingSemaphore> ForkRing<S> {
    /// Builds `count` forks with `make`.
    ///
    /// If building fork `k` fails, forks `k-1` down to `0` are dropped in
    /// that order before the error is returned.
    pub fn try_build<F>(count: usize, mut make: F) -> Result<Self, CoreError>
    where
        F: FnMut(usize) -> Result<S, EnvError>,
    {
        let mut forks = Vec::with_capacity(count);
        for index in 0..count {
            match make(index) {
                Ok(fork) => forks.push(fork),
                Err(err) => {
                    debug!(built = forks.len(), "fork construction failed, unwinding");
                    while let Some(fork) = forks.pop() {
                        drop(fork);
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(Self {
            holders: (0..count).map(|_| AtomicUsize::new(FREE)).collect(),
            forks,
        })
    }

    /// Number of forks on the table.
    pub fn len(&self) -> usize {
        self.forks.len()
    }

    /// True for a table without forks.
    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    /// Blocks until fork `index` is free, then records `who` as its holder.
    ///
    /// On error the caller holds nothing: a permit obtained for a fork that
    /// is still recorded as held is handed back before reporting.
    pub fn take(&self, index: usize, who: PhilosopherId) -> Result<(), CoreError> {
        self.forks[index].acquire()?;
        if let Err(holder) = self.holders[index].compare_exchange(
            FREE,
            who.get() as usize,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            self.forks[index].release()?;
            return Err(CoreError::ForkContention {
                fork: index,
                holder,
                intruder: who,
            });
        }
        Ok(())
    }

    /// Clears the holder record and returns fork `index`. Never blocks.
    ///
    /// Only the recorded holder may put a fork down; anyone else gets
    /// [`CoreError::ForeignRelease`] and the fork stays taken.
    pub fn put_down(&self, index: usize, who: PhilosopherId) -> Result<(), CoreError> {
        if let Err(holder) = self.holders[index].compare_exchange(
            who.get() as usize,
            FREE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            warn!(fork = index, holder, releaser = %who, "fork put down by a non-holder");
            return Err(CoreError::ForeignRelease {
                fork: index,
                holder,
                releaser: who,
            });
        }
        self.forks[index].release()?;
        Ok(())
    }

    /// Current holder of fork `index`, as recorded by this process.
    pub fn holder(&self, index: usize) -> Option<PhilosopherId> {
        PhilosopherId::new(self.holders[index].load(Ordering::Acquire) as u32)
    }
}
