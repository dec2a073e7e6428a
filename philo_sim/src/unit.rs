//! Entry point of a philosopher process.

use crate::error::SimError;
use philo_core::{
    ForkRing, PhilosopherId, Rules, SemaphoreHerald, StopFlag, Terminator, Unit, UnitExit,
};
use philo_env::{MonotonicClock, NamedSemaphore, RunId};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// What a child needs besides the rules to find its place at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSpec {
    pub id: PhilosopherId,

    /// Launcher's clock reading at launch
    pub epoch: Duration,

    /// Run whose semaphores to attach to
    pub run_id: RunId,
}

/// Ends the process on the spot. Nothing is unwound; the kernel closes the
/// semaphore handles and the launcher unlinks the names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, exit: UnitExit) {
        std::process::exit(exit.code());
    }
}

/// Runs philosopher `spec.id` in this process and returns its exit status.
pub fn run_unit(rules: Rules, spec: &UnitSpec) -> UnitExit {
    match attach_and_run(rules, spec) {
        Ok(exit) => exit,
        Err(err) => {
            error!(philosopher = %spec.id, error = %err, "philosopher process failed");
            UnitExit::Failed
        }
    }
}

fn attach_and_run(rules: Rules, spec: &UnitSpec) -> Result<UnitExit, SimError> {
    let forks = ForkRing::try_build(rules.philosophers(), |index| {
        NamedSemaphore::open(spec.run_id.fork_name(index)?)
    })?;
    let print = NamedSemaphore::open(spec.run_id.print_name()?)?;
    debug!(philosopher = %spec.id, run = %spec.run_id, "attached to semaphores");

    let clock = MonotonicClock::new();
    let stop = Arc::new(StopFlag::new());
    let herald = SemaphoreHerald::new(print, clock, io::stdout(), Arc::clone(&stop), spec.epoch);
    let unit = Unit::new(rules, spec.id, spec.epoch, clock, forks, herald, stop);

    Ok(unit.run(&ProcessTerminator)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_semaphores_fail_the_unit() {
        let rules = Rules::new(2, 400, 100, 100, None).unwrap();
        let spec = UnitSpec {
            id: PhilosopherId::new(1).unwrap(),
            epoch: Duration::ZERO,
            run_id: RunId::new(),
        };

        assert_eq!(run_unit(rules, &spec), UnitExit::Failed);
    }
}
