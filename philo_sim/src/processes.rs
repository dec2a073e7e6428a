//! Isolated-memory launcher.
//!
//! Creates the named semaphores, starts one child process per philosopher
//! by re-executing this binary with hidden unit arguments, and reaps them.
//! The first death or failure brings every sibling down. Semaphores are
//! unlinked only once every child has been waited for.

use crate::error::SimError;
use crate::signals;
use crate::unit::UnitSpec;
use philo_core::{ForkRing, Outcome, PhilosopherId, Rules, StopFlag, UnitExit, POLL_INTERVAL};
use philo_env::{Clock, MonotonicClock, NamedSemaphore, RunId};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{debug, error, info, warn};

type Children = Vec<(PhilosopherId, Child)>;

/// Launches and supervises the philosopher processes of one run.
#[derive(Debug, Clone)]
pub struct Launcher {
    rules: Rules,

    /// Binary re-executed for every philosopher
    program: PathBuf,

    /// Prefix of every semaphore name of this run
    run_id: RunId,

    /// Forward `--verbose` to the children
    verbose: bool,
}

impl Launcher {
    pub fn new(rules: Rules, program: impl Into<PathBuf>) -> Self {
        Self {
            rules,
            program: program.into(),
            run_id: RunId::new(),
            verbose: false,
        }
    }

    /// Launcher that re-executes the running binary.
    pub fn current(rules: Rules) -> Result<Self, SimError> {
        let program = std::env::current_exe().map_err(SimError::Executable)?;
        Ok(Self::new(rules, program))
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Runs the simulation to its end. Blocks until every child is reaped.
    pub fn run(&self, stop: &StopFlag) -> Result<Outcome, SimError> {
        if self.rules.goal_is_trivial() {
            return Ok(Outcome::Sated);
        }

        let n = self.rules.philosophers();
        let forks = ForkRing::try_build(n, |index| {
            NamedSemaphore::create(self.run_id.fork_name(index)?, 1)
        })?;
        let print = NamedSemaphore::create(self.run_id.print_name()?, 1)?;

        let epoch = MonotonicClock::new().now();
        let mut children = self.spawn_all(epoch)?;
        info!(philosophers = n, run = %self.run_id, "processes launched");

        let outcome = self.supervise(&mut children, stop);
        kill_and_wait(&mut children);
        debug!("all philosophers reaped, removing semaphores");
        drop(print);
        drop(forks);
        outcome
    }

    fn spawn_all(&self, epoch: Duration) -> Result<Children, SimError> {
        let mut children = Vec::with_capacity(self.rules.philosophers());
        for index in 0..self.rules.philosophers() {
            let who = PhilosopherId::from_index(index);
            let spec = UnitSpec {
                id: who,
                epoch,
                run_id: self.run_id,
            };
            let spawned = Command::new(&self.program)
                .args(unit_arguments(&self.rules, &spec, self.verbose))
                .stdin(Stdio::null())
                .spawn();

            match spawned {
                Ok(child) => children.push((who, child)),
                Err(source) => {
                    error!(philosopher = %who, error = %source, "spawn failed");
                    kill_and_wait(&mut children);
                    return Err(SimError::Spawn {
                        philosopher: who,
                        source,
                    });
                }
            }
        }
        Ok(children)
    }

    /// Polls the children until one dies, one fails, all are sated or the
    /// run is interrupted. Reaped children are removed from `children`.
    fn supervise(&self, children: &mut Children, stop: &StopFlag) -> Result<Outcome, SimError> {
        let clock = MonotonicClock::new();
        loop {
            if stop.observe() {
                return Ok(Outcome::Interrupted);
            }

            let mut index = 0;
            while index < children.len() {
                let who = children[index].0;
                let status = children[index]
                    .1
                    .try_wait()
                    .map_err(|source| SimError::Reap {
                        philosopher: who,
                        source,
                    })?;
                let Some(status) = status else {
                    index += 1;
                    continue;
                };
                children.swap_remove(index);

                match status.code().and_then(UnitExit::from_code) {
                    Some(UnitExit::Sated) => debug!(philosopher = %who, "sated"),
                    Some(UnitExit::Died) => {
                        info!(philosopher = %who, "death reported");
                        return Ok(Outcome::Death {
                            philosopher: who,
                            at_ms: None,
                        });
                    }
                    _ if stop.observe() || signals::interrupted(&status) => {
                        info!(philosopher = %who, %status, "interrupted");
                        return Ok(Outcome::Interrupted);
                    }
                    _ => {
                        error!(philosopher = %who, %status, "philosopher failed");
                        return Err(SimError::UnitFailed {
                            philosopher: who,
                            status,
                        });
                    }
                }
            }

            if children.is_empty() {
                return Ok(Outcome::Sated);
            }
            clock.pause(POLL_INTERVAL);
        }
    }
}

/// Command line that turns the binary into philosopher `spec.id`.
pub fn unit_arguments(rules: &Rules, spec: &UnitSpec, verbose: bool) -> Vec<String> {
    let mut args = vec![
        rules.philosophers().to_string(),
        rules.time_to_die().as_millis().to_string(),
        rules.time_to_eat().as_millis().to_string(),
        rules.time_to_sleep().as_millis().to_string(),
    ];
    if let Some(goal) = rules.meal_goal() {
        args.push(goal.to_string());
    }
    args.extend(["--model".to_string(), "processes".to_string()]);
    if !rules.balances_odd_ring() {
        args.push("--no-odd-balance".to_string());
    }
    if verbose {
        args.push("--verbose".to_string());
    }
    args.extend([
        "--unit".to_string(),
        spec.id.to_string(),
        "--epoch-us".to_string(),
        (spec.epoch.as_micros() as u64).to_string(),
        "--run-id".to_string(),
        spec.run_id.to_string(),
    ]);
    args
}

/// Kills every child still running and waits for all of them.
fn kill_and_wait(children: &mut Children) {
    for (who, child) in children.iter_mut() {
        if let Err(err) = child.kill() {
            debug!(philosopher = %who, error = %err, "kill failed");
        }
    }
    for (who, mut child) in children.drain(..) {
        if let Err(err) = child.wait() {
            warn!(philosopher = %who, error = %err, "wait failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unit_arguments() {
        let rules = Rules::new(5, 800, 200, 200, Some(7))
            .unwrap()
            .with_odd_balance(false);
        let run_id = RunId::new();
        let spec = UnitSpec {
            id: PhilosopherId::new(3).unwrap(),
            epoch: Duration::from_micros(1_234_567),
            run_id,
        };

        let args = unit_arguments(&rules, &spec, true);

        assert_eq!(
            args,
            vec![
                "5".to_string(),
                "800".into(),
                "200".into(),
                "200".into(),
                "7".into(),
                "--model".into(),
                "processes".into(),
                "--no-odd-balance".into(),
                "--verbose".into(),
                "--unit".into(),
                "3".into(),
                "--epoch-us".into(),
                "1234567".into(),
                "--run-id".into(),
                run_id.to_string(),
            ]
        );
    }

    #[test]
    fn test_unbounded_run_omits_goal() {
        let rules = Rules::new(4, 410, 200, 200, None).unwrap();
        let spec = UnitSpec {
            id: PhilosopherId::new(1).unwrap(),
            epoch: Duration::ZERO,
            run_id: RunId::new(),
        };

        let args = unit_arguments(&rules, &spec, false);

        assert_eq!(&args[..6], &["4", "410", "200", "200", "--model", "processes"]);
        assert!(!args.contains(&"--verbose".to_string()));
    }

    #[test]
    fn test_spawn_failure_cleans_up() {
        let rules = Rules::new(3, 400, 100, 100, None).unwrap();
        let launcher = Launcher::new(rules, "/nonexistent/philo");
        let run_id = launcher.run_id();

        let err = launcher.run(&StopFlag::new()).unwrap_err();

        assert!(matches!(err, SimError::Spawn { ref philosopher, .. } if philosopher.get() == 1));
        assert!(NamedSemaphore::open(run_id.print_name().unwrap()).is_err());
        assert!(NamedSemaphore::open(run_id.fork_name(0).unwrap()).is_err());
    }

    #[test]
    fn test_child_killed_by_interrupt_ends_run_as_interrupted() {
        let rules = Rules::new(2, 400, 100, 100, None).unwrap();
        let launcher = Launcher::new(rules, "/bin/sh");
        let interrupted = Command::new("/bin/sh")
            .args(["-c", "kill -TERM $$"])
            .spawn()
            .unwrap();
        let sibling = Command::new("/bin/sh")
            .args(["-c", "exec sleep 5"])
            .spawn()
            .unwrap();
        let mut children = vec![
            (PhilosopherId::new(1).unwrap(), interrupted),
            (PhilosopherId::new(2).unwrap(), sibling),
        ];
        let stop = StopFlag::new();

        let outcome = launcher.supervise(&mut children, &stop).unwrap();
        kill_and_wait(&mut children);

        assert_eq!(outcome, Outcome::Interrupted);
        assert!(children.is_empty());
    }

    #[test]
    fn test_trivial_goal_launches_nothing() {
        let rules = Rules::new(3, 400, 100, 100, Some(0)).unwrap();
        let launcher = Launcher::new(rules, "/nonexistent/philo");

        assert_eq!(launcher.run(&StopFlag::new()).unwrap(), Outcome::Sated);
    }

    proptest! {
        #[test]
        fn prop_unit_arguments_carry_the_rules(
            n in 1u64..=200,
            die in 1u64..100_000,
            eat in 1u64..100_000,
            sleep in 1u64..100_000,
            goal in proptest::option::of(0u64..1_000),
        ) {
            let rules = Rules::new(n, die, eat, sleep, goal).unwrap();
            let spec = UnitSpec {
                id: PhilosopherId::new(1).unwrap(),
                epoch: Duration::ZERO,
                run_id: RunId::new(),
            };

            let args = unit_arguments(&rules, &spec, false);
            let numbers: Vec<u64> = args
                .iter()
                .take_while(|arg| !arg.starts_with("--"))
                .map(|arg| arg.parse().unwrap())
                .collect();
            let back = Rules::new(numbers[0], numbers[1], numbers[2], numbers[3], numbers.get(4).copied())
                .unwrap();

            prop_assert_eq!(back, rules);
        }
    }
}
