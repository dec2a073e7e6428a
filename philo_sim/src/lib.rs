//! Philo Simulation Harness
//!
//! Runs the dining philosophers under either execution model and reports
//! how the run ended.
//!
//! - **threads**: [`run_threads`] builds a [`philo_core::Table`] over stdout.
//! - **processes**: [`Launcher`] creates named semaphores and re-executes the
//!   binary once per philosopher; each child enters through [`run_unit`].
//!
//! Logging goes to stderr only. Stdout carries nothing but the event log.

pub mod error;
pub mod limit;
pub mod processes;
pub mod report;
pub mod scenarios;
pub mod signals;
pub mod threads;
pub mod unit;

pub use error::SimError;
pub use limit::TimeLimit;
pub use processes::{unit_arguments, Launcher};
pub use report::{Model, RunReport};
pub use scenarios::{Expectation, ScenarioId, ScenarioResult};
pub use threads::{run_threads, ThreadsRun};
pub use unit::{run_unit, ProcessTerminator, UnitSpec};

use philo_core::Outcome;

/// Launcher exit status for a finished run.
///
/// A death is a normal end of the simulation, not a failure.
pub fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Death { .. } | Outcome::Sated | Outcome::Survived => 0,
        Outcome::Interrupted => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use philo_core::PhilosopherId;

    #[test]
    fn test_exit_codes() {
        let death = Outcome::Death {
            philosopher: PhilosopherId::new(2).unwrap(),
            at_ms: None,
        };
        assert_eq!(exit_code(&death), 0);
        assert_eq!(exit_code(&Outcome::Sated), 0);
        assert_eq!(exit_code(&Outcome::Survived), 0);
        assert_eq!(exit_code(&Outcome::Interrupted), 130);
    }
}
