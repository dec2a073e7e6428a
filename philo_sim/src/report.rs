//! JSON run report.
//!
//! Written with `--report <PATH>` after the run, so it never mixes with the
//! event log on stdout.

use crate::error::SimError;
use crate::scenarios::ScenarioResult;
use philo_core::{Outcome, Rules};
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// Which execution model ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// One thread per philosopher, shared memory
    Threads,
    /// One process per philosopher, named semaphores
    Processes,
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Threads => write!(f, "threads"),
            Model::Processes => write!(f, "processes"),
        }
    }
}

/// Complete run report.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub model: Model,

    /// Preset and its pass/fail verdict, if the run came from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioResult>,

    pub rules: Rules,

    pub outcome: Outcome,

    /// Wall time from launch to the last reaped unit
    pub wall_time_ms: u64,

    /// Meals per philosopher in seat order; threads model only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meals: Option<Vec<u32>>,
}

impl RunReport {
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path).map_err(|source| SimError::Report {
            path: path.to_string(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|source| SimError::Report {
                path: path.to_string(),
                source,
            })?;
        Ok(())
    }
}
