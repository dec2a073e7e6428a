//! Error types for the environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Name cannot be handed to the OS (interior NUL, missing leading slash, too long)
    #[error("Invalid semaphore name {0:?}")]
    InvalidName(String),

    /// Creating a named semaphore failed
    #[error("Failed to create semaphore {name}: {source}")]
    SemaphoreCreate {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Attaching to an existing named semaphore failed
    #[error("Failed to open semaphore {name}: {source}")]
    SemaphoreOpen {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a semaphore failed for a reason other than an interrupt
    #[error("Semaphore wait failed: {0}")]
    SemaphoreWait(#[source] std::io::Error),

    /// Posting a semaphore failed
    #[error("Semaphore post failed: {0}")]
    SemaphorePost(#[source] std::io::Error),

    /// An in-process lock was poisoned by a panicking holder
    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl EnvError {
    /// Creates a poisoned-lock error for the named lock.
    pub fn poisoned(what: &'static str) -> Self {
        Self::Poisoned(what)
    }
}
