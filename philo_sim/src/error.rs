//! Errors of the launchers and the command line.

use philo_core::{CoreError, PhilosopherId};
use philo_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Env(#[from] EnvError),

    /// The current executable could not be located for re-execution
    #[error("cannot locate the philo executable: {0}")]
    Executable(#[source] std::io::Error),

    /// A philosopher process could not be started
    #[error("failed to spawn philosopher {philosopher}: {source}")]
    Spawn {
        philosopher: PhilosopherId,
        #[source]
        source: std::io::Error,
    },

    /// Polling or waiting for a child failed
    #[error("failed to reap philosopher {philosopher}: {source}")]
    Reap {
        philosopher: PhilosopherId,
        #[source]
        source: std::io::Error,
    },

    /// A philosopher process ended with a failure status
    #[error("philosopher {philosopher} failed ({status})")]
    UnitFailed {
        philosopher: PhilosopherId,
        status: std::process::ExitStatus,
    },

    /// Signal handlers could not be installed
    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    /// The time limit thread could not be started
    #[error("failed to start the time limit: {0}")]
    Timer(#[source] std::io::Error),

    /// The JSON report could not be written
    #[error("failed to write report to {path}: {source}")]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
