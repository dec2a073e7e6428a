//! One philosopher of the isolated-memory model, with its own watchdog.

use crate::config::Rules;
use crate::error::CoreError;
use crate::herald::Herald;
use crate::monitor::{Terminator, Watchdog};
use crate::philosopher::{Philosopher, PhilosopherId};
use crate::ring::ForkRing;
use crate::routine::Routine;
use crate::stop::{StopFlag, StopOnPanic};
use philo_env::{Clock, CountingSemaphore};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

/// How a unit ended. Doubles as the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitExit {
    /// Reached the meal goal
    Sated,
    /// Internal failure
    Failed,
    /// Starved
    Died,
}

impl UnitExit {
    pub fn code(&self) -> i32 {
        match self {
            UnitExit::Sated => 0,
            UnitExit::Failed => 1,
            UnitExit::Died => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(UnitExit::Sated),
            1 => Some(UnitExit::Failed),
            2 => Some(UnitExit::Died),
            _ => None,
        }
    }
}

/// A philosopher together with the forks and herald it reaches through
/// shared kernel objects.
pub struct Unit<C, S, H> {
    rules: Rules,
    philosopher: Philosopher,
    epoch: Duration,
    clock: C,
    ring: ForkRing<S>,
    herald: H,

    /// Local to this unit; set by the watchdog or on the way out
    stop: Arc<StopFlag>,
}

impl<C, S, H> Unit<C, S, H>
where
    C: Clock,
    S: CountingSemaphore,
    H: Herald,
{
    /// `stop` must be the flag `herald` was built with.
    pub fn new(
        rules: Rules,
        id: PhilosopherId,
        epoch: Duration,
        clock: C,
        ring: ForkRing<S>,
        herald: H,
        stop: Arc<StopFlag>,
    ) -> Self {
        let philosopher = Philosopher::seat_at_table(id.index(), rules.philosophers());
        Self {
            rules,
            philosopher,
            epoch,
            clock,
            ring,
            herald,
            stop,
        }
    }

    pub fn id(&self) -> PhilosopherId {
        self.philosopher.id()
    }

    /// Runs the philosopher with its watchdog alongside.
    ///
    /// The watchdog hands a death to `terminator`; if that returns, the
    /// unit winds down and reports [`UnitExit::Died`].
    pub fn run<T: Terminator>(&self, terminator: &T) -> Result<UnitExit, CoreError> {
        if self.rules.goal_is_trivial() {
            return Ok(UnitExit::Sated);
        }
        self.philosopher.mark_launched(self.epoch)?;
        let who = self.philosopher.id();

        thread::scope(|scope| {
            let watchdog = Watchdog {
                clock: &self.clock,
                rules: &self.rules,
                philosopher: &self.philosopher,
                herald: &self.herald,
                stop: &*self.stop,
                terminator,
            };
            let handle = thread::Builder::new()
                .name(format!("watchdog-{who}"))
                .spawn_scoped(scope, move || watchdog.watch())
                .map_err(|source| CoreError::Launch {
                    philosopher: who,
                    source,
                })?;

            let result = {
                let _guard = StopOnPanic(&self.stop);
                Routine::new(
                    &self.clock,
                    &self.rules,
                    &self.ring,
                    &self.herald,
                    &self.philosopher,
                    &self.stop,
                )
                .run_isolated()
            };
            self.stop.trigger();

            let died = handle.join().map_err(|_| CoreError::Panicked(who))??;
            if died {
                return Ok(UnitExit::Died);
            }
            match &result {
                Ok(exit) => debug!(philosopher = %who, ?exit, "unit finished"),
                Err(err) => error!(philosopher = %who, error = %err, "unit failed"),
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::herald::SemaphoreHerald;
    use crate::test_support::{parse_line, SharedBuffer};
    use philo_env::{LocalSemaphore, MonotonicClock};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<UnitExit>>);

    impl Terminator for Recorder {
        fn terminate(&self, exit: UnitExit) {
            self.0.lock().unwrap().push(exit);
        }
    }

    type TestUnit = Unit<
        MonotonicClock,
        LocalSemaphore,
        SemaphoreHerald<LocalSemaphore, MonotonicClock, SharedBuffer>,
    >;

    fn unit(rules: Rules, number: u32, out: &SharedBuffer) -> TestUnit {
        let clock = MonotonicClock::new();
        let epoch = clock.now();
        let stop = Arc::new(StopFlag::new());
        let ring = ForkRing::try_build(rules.philosophers(), |_| Ok(LocalSemaphore::binary()))
            .unwrap();
        let herald = SemaphoreHerald::new(
            LocalSemaphore::binary(),
            clock,
            out.clone(),
            Arc::clone(&stop),
            epoch,
        );
        Unit::new(
            rules,
            PhilosopherId::new(number).unwrap(),
            epoch,
            clock,
            ring,
            herald,
            stop,
        )
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(UnitExit::Sated.code(), 0);
        assert_eq!(UnitExit::Failed.code(), 1);
        assert_eq!(UnitExit::Died.code(), 2);
        assert_eq!(UnitExit::from_code(2), Some(UnitExit::Died));
        assert_eq!(UnitExit::from_code(9), None);
    }

    #[test]
    fn test_solo_unit_dies_on_time() {
        let out = SharedBuffer::new();
        let terminator = Recorder::default();

        let exit = unit(Rules::new(1, 60, 10, 10, None).unwrap(), 1, &out)
            .run(&terminator)
            .unwrap();

        assert_eq!(exit, UnitExit::Died);
        assert_eq!(*terminator.0.lock().unwrap(), vec![UnitExit::Died]);

        let lines = out.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert_eq!(parse_line(&lines[0]).2, "has taken a fork");
        let (died_at, who, event) = parse_line(&lines[1]);
        assert_eq!((who, event.as_str()), (1, "died"));
        assert!((60..80).contains(&died_at), "died at {died_at}");
    }

    #[test]
    fn test_unit_reaches_goal_without_watchdog_firing() {
        let out = SharedBuffer::new();
        let terminator = Recorder::default();

        let exit = unit(Rules::new(3, 500, 20, 20, Some(3)).unwrap(), 2, &out)
            .run(&terminator)
            .unwrap();

        assert_eq!(exit, UnitExit::Sated);
        assert!(terminator.0.lock().unwrap().is_empty());
        let meals = out
            .lines()
            .iter()
            .filter(|line| line.ends_with("is eating"))
            .count();
        assert_eq!(meals, 3);
    }

    #[test]
    fn test_trivial_goal_unit_is_silent() {
        let out = SharedBuffer::new();
        let exit = unit(Rules::new(4, 500, 20, 20, Some(0)).unwrap(), 3, &out)
            .run(&Recorder::default())
            .unwrap();

        assert_eq!(exit, UnitExit::Sated);
        assert!(out.lines().is_empty());
    }
}
