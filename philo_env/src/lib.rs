//! Philo Environment Abstraction Layer
//!
//! This crate isolates everything the coordination engine needs from the
//! operating system, so the same engine runs against real time and kernel
//! objects in production and against a virtual clock in tests:
//!
//! - Time (`now()`, `pause()`)
//! - Counting semaphores, both in-process and named across processes
//! - Run identity, from which every named object of a launch is derived
//!
//! # Example
//!
//! ```ignore
//! use philo_env::{Clock, CountingSemaphore, LocalSemaphore, MonotonicClock};
//!
//! let clock = MonotonicClock::new();
//! let fork = LocalSemaphore::binary();
//! fork.acquire()?;
//! clock.pause(Duration::from_millis(200));
//! fork.release()?;
//! ```

mod clock;
mod error;
mod manual;
#[cfg(unix)]
mod named;
mod semaphore;
mod types;

pub use clock::{Clock, MonotonicClock};
pub use error::EnvError;
pub use manual::ManualClock;
#[cfg(unix)]
pub use named::NamedSemaphore;
pub use semaphore::{CountingSemaphore, LocalSemaphore};
pub use types::{RunId, SemaphoreName};
