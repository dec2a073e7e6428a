//! Philo Core - The Coordination Engine
//!
//! This crate contains the dining-philosophers engine: how philosophers
//! take forks without deadlocking, how their meals are timed, and how
//! starvation is detected and turned into a clean, global stop.
//!
//! # Architecture
//!
//! Two execution models share the same rules, protocol and action loop:
//!
//! - **Shared memory** ([`Table`]): one thread per philosopher, forks are
//!   in-process semaphores, a single [`Monitor`] polls every meal log.
//! - **Isolated memory** ([`Unit`]): one process per philosopher, forks are
//!   named semaphores, each unit carries its own [`Watchdog`] and ends its
//!   own process on starvation.
//!
//! Everything time-related goes through [`philo_env::Clock`], so the action
//! loop and the monitors run against a virtual clock in tests.
//!
//! # Example
//!
//! ```ignore
//! use philo_core::{Rules, Table};
//! use philo_env::MonotonicClock;
//!
//! let rules = Rules::new(5, 800, 200, 200, Some(7))?;
//! let table = Table::new(rules, MonotonicClock::new(), std::io::stdout())?;
//! let outcome = table.run()?;
//! ```

pub mod config;
pub mod error;
pub mod herald;
pub mod monitor;
pub mod nap;
pub mod outcome;
pub mod philosopher;
pub mod protocol;
pub mod ring;
pub mod routine;
pub mod stop;
pub mod table;
pub mod unit;

#[cfg(test)]
mod test_support;

pub use config::{Rules, MAX_PHILOSOPHERS, POLL_INTERVAL, STARTUP_STAGGER};
pub use error::{ConfigError, CoreError};
pub use herald::{ConsoleHerald, Event, Herald, SemaphoreHerald};
pub use monitor::{confirm_death, Monitor, Terminator, Verdict, Watchdog};
pub use nap::{nap, sleep_until, SleepOutcome};
pub use outcome::Outcome;
pub use philosopher::{MealLog, Philosopher, PhilosopherId};
pub use ring::{neighbor, ForkRing, Seat, Side};
pub use routine::Routine;
pub use stop::{StopFlag, StopOnPanic};
pub use table::{Spawner, Table, ThreadSpawner};
pub use unit::{Unit, UnitExit};
