//! Shared-memory launcher.

use crate::error::SimError;
use philo_core::{Outcome, Rules, StopFlag, Table};
use philo_env::MonotonicClock;
use std::io;
use std::sync::Arc;
use tracing::info;

/// Result of a threads-model run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadsRun {
    pub outcome: Outcome,

    /// Meals per philosopher, in seat order
    pub meals: Vec<u32>,
}

/// Runs `rules` on one thread per philosopher, printing the event log to
/// stdout. `stop` lets a signal handler end the run early.
pub fn run_threads(rules: Rules, stop: Arc<StopFlag>) -> Result<ThreadsRun, SimError> {
    let table = Table::with_stop(rules, MonotonicClock::new(), io::stdout(), stop)?;
    let outcome = table.run()?;
    let meals = table.meal_counts()?;
    info!(%outcome, "threads run finished");
    Ok(ThreadsRun { outcome, meals })
}
