//! Error types for the coordination engine.

use crate::philosopher::PhilosopherId;
use philo_env::EnvError;
use thiserror::Error;

/// Rejected configuration. Raised before any simulation state exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Philosopher count outside 1..=200
    #[error("number of philosophers must be between 1 and 200 (got {0})")]
    PhilosopherCount(u64),

    /// A duration argument was zero
    #[error("{0} must be greater than 0")]
    ZeroDuration(&'static str),

    /// A duration argument does not fit in the supported range
    #[error("{name} is out of range (got {value} ms)")]
    DurationOutOfRange { name: &'static str, value: u64 },

    /// Meal goal does not fit in the supported range
    #[error("number of meals is out of range (got {0})")]
    MealGoalOutOfRange(u64),
}

/// Errors raised while building or running a simulation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration was invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A clock, semaphore or lock of the environment failed
    #[error(transparent)]
    Env(#[from] EnvError),

    /// A fork was acquired while the ring still recorded another holder
    #[error("fork {fork} acquired by philosopher {intruder} while held by philosopher {holder}")]
    ForkContention {
        fork: usize,
        holder: usize,
        intruder: PhilosopherId,
    },

    /// A fork was put down by someone the ring does not record as holding it
    #[error("fork {fork} put down by philosopher {releaser} while held by philosopher {holder}")]
    ForeignRelease {
        fork: usize,
        holder: usize,
        releaser: PhilosopherId,
    },

    /// A per-philosopher or output lock was poisoned
    #[error("lock poisoned: {0}")]
    Poisoned(&'static str),

    /// Writing an announcement failed
    #[error("failed to write announcement: {0}")]
    Output(#[from] std::io::Error),

    /// An actor thread could not be created
    #[error("failed to launch philosopher {philosopher}: {source}")]
    Launch {
        philosopher: PhilosopherId,
        #[source]
        source: std::io::Error,
    },

    /// An actor thread panicked
    #[error("philosopher {0} panicked")]
    Panicked(PhilosopherId),

    /// `run` was called on a table that already ran
    #[error("simulation already started")]
    AlreadyStarted,
}
