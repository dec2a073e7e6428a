//! Counting semaphore abstraction.

use crate::error::EnvError;
use std::sync::{Condvar, Mutex};

/// A counting semaphore that may live inside one process or span several.
///
/// # Implementations
///
/// - **Shared memory**: `LocalSemaphore` - mutex + condition variable
/// - **Isolated memory**: `NamedSemaphore` - POSIX named semaphore
///
/// `acquire` suspends the caller without busy polling until a permit is
/// available. `release` never blocks.
pub trait CountingSemaphore: Send + Sync {
    /// Takes one permit, blocking until one is available.
    fn acquire(&self) -> Result<(), EnvError>;

    /// Returns one permit.
    fn release(&self) -> Result<(), EnvError>;
}

/// In-process counting semaphore.
///
/// A binary `LocalSemaphore` is the fork of the shared-memory model.
#[derive(Debug)]
pub struct LocalSemaphore {
    /// Permits currently available
    permits: Mutex<usize>,

    /// Signalled whenever a permit is returned
    cond: Condvar,
}

impl LocalSemaphore {
    /// Creates a semaphore with `permits` initial permits.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cond: Condvar::new(),
        }
    }

    /// Creates a semaphore holding exactly one permit.
    pub fn binary() -> Self {
        Self::new(1)
    }

    /// Returns the number of permits currently available.
    pub fn available(&self) -> Result<usize, EnvError> {
        let permits = self
            .permits
            .lock()
            .map_err(|_| EnvError::poisoned("semaphore permits"))?;
        Ok(*permits)
    }
}

impl CountingSemaphore for LocalSemaphore {
    fn acquire(&self) -> Result<(), EnvError> {
        let mut permits = self
            .permits
            .lock()
            .map_err(|_| EnvError::poisoned("semaphore permits"))?;
        while *permits == 0 {
            permits = self
                .cond
                .wait(permits)
                .map_err(|_| EnvError::poisoned("semaphore permits"))?;
        }
        *permits -= 1;
        Ok(())
    }

    fn release(&self) -> Result<(), EnvError> {
        let mut permits = self
            .permits
            .lock()
            .map_err(|_| EnvError::poisoned("semaphore permits"))?;
        *permits += 1;
        self.cond.notify_one();
        Ok(())
    }
}
