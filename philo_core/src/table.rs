//! The shared-memory model: one thread per philosopher and a central
//! monitor on the calling thread.

use crate::config::Rules;
use crate::error::CoreError;
use crate::herald::ConsoleHerald;
use crate::monitor::{Monitor, Verdict};
use crate::outcome::Outcome;
use crate::philosopher::{Philosopher, PhilosopherId};
use crate::ring::ForkRing;
use crate::routine::Routine;
use crate::stop::{StopFlag, StopOnPanic};
use philo_env::{Clock, LocalSemaphore};
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Launches actor threads. The seam exists so a launch failure can be
/// injected.
pub trait Spawner {
    fn spawn<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        body: F,
    ) -> io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope;
}

/// Named OS threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        body: F,
    ) -> io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        thread::Builder::new().name(name).spawn_scoped(scope, body)
    }
}

type Handles<'scope> = Vec<(PhilosopherId, ScopedJoinHandle<'scope, Result<(), CoreError>>)>;

/// A dining table in one address space.
pub struct Table<C, W> {
    rules: Rules,
    clock: C,
    ring: ForkRing<LocalSemaphore>,
    philosophers: Vec<Philosopher>,
    herald: ConsoleHerald<C, W>,
    stop: Arc<StopFlag>,

    /// Clock reading at launch; set once
    epoch: OnceLock<Duration>,
}

impl<C, W> Table<C, W>
where
    C: Clock + Clone,
    W: Write + Send,
{
    /// Lays the table: one fork and one philosopher per seat.
    pub fn new(rules: Rules, clock: C, sink: W) -> Result<Self, CoreError> {
        Self::with_stop(rules, clock, sink, Arc::new(StopFlag::new()))
    }

    /// Like [`Table::new`], sharing an externally owned stop flag, e.g. one
    /// a signal handler triggers.
    pub fn with_stop(
        rules: Rules,
        clock: C,
        sink: W,
        stop: Arc<StopFlag>,
    ) -> Result<Self, CoreError> {
        let n = rules.philosophers();
        let ring = ForkRing::try_build(n, |_| Ok(LocalSemaphore::binary()))?;
        let philosophers = (0..n).map(|i| Philosopher::seat_at_table(i, n)).collect();
        let herald = ConsoleHerald::new(clock.clone(), sink, Arc::clone(&stop));

        Ok(Self {
            rules,
            clock,
            ring,
            philosophers,
            herald,
            stop,
            epoch: OnceLock::new(),
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// The stop flag shared by every philosopher of this table.
    pub fn stop_handle(&self) -> Arc<StopFlag> {
        Arc::clone(&self.stop)
    }

    /// Runs the simulation on named OS threads.
    pub fn run(&self) -> Result<Outcome, CoreError> {
        self.run_with(&ThreadSpawner)
    }

    /// Runs the simulation, launching philosophers through `spawner`.
    ///
    /// Blocks until every philosopher thread has been joined.
    pub fn run_with<P: Spawner>(&self, spawner: &P) -> Result<Outcome, CoreError> {
        let start = self.clock.now();
        self.epoch
            .set(start)
            .map_err(|_| CoreError::AlreadyStarted)?;

        if self.rules.goal_is_trivial() {
            self.stop.trigger();
            return Ok(Outcome::Sated);
        }

        self.herald.open(start);
        for philosopher in &self.philosophers {
            philosopher.mark_launched(start)?;
        }
        info!(philosophers = self.philosophers.len(), "table launched");

        let verdict = thread::scope(|scope| {
            let handles = self.launch(scope, spawner)?;

            let verdict = Monitor {
                clock: &self.clock,
                rules: &self.rules,
                philosophers: &self.philosophers,
                herald: &self.herald,
                stop: &*self.stop,
            }
            .watch();
            self.stop.trigger();

            let joined = join_all(handles);
            debug!("all philosophers joined");
            joined?;
            verdict
        })?;

        Ok(match verdict {
            Verdict::Death { who, at } => Outcome::Death {
                philosopher: who,
                at_ms: Some(at.saturating_sub(start).as_millis() as u64),
            },
            Verdict::Sated => Outcome::Sated,
            Verdict::Halted => Outcome::Interrupted,
        })
    }

    fn launch<'scope, P: Spawner>(
        &'scope self,
        scope: &'scope Scope<'scope, '_>,
        spawner: &P,
    ) -> Result<Handles<'scope>, CoreError> {
        let mut handles = Vec::with_capacity(self.philosophers.len());
        for philosopher in &self.philosophers {
            let who = philosopher.id();
            let routine = Routine::new(
                &self.clock,
                &self.rules,
                &self.ring,
                &self.herald,
                philosopher,
                &*self.stop,
            );
            let stop = &*self.stop;
            let body = move || {
                let _guard = StopOnPanic(stop);
                let result = routine.run_shared();
                if let Err(err) = &result {
                    error!(philosopher = %who, error = %err, "philosopher failed");
                    stop.trigger();
                }
                result
            };

            match spawner.spawn(scope, format!("philosopher-{who}"), body) {
                Ok(handle) => handles.push((who, handle)),
                Err(source) => {
                    error!(philosopher = %who, error = %source, "launch failed");
                    self.stop.trigger();
                    let _ = join_all(handles);
                    return Err(CoreError::Launch {
                        philosopher: who,
                        source,
                    });
                }
            }
        }
        Ok(handles)
    }

    /// Meals eaten so far, in seat order.
    pub fn meal_counts(&self) -> Result<Vec<u32>, CoreError> {
        self.philosophers
            .iter()
            .map(|p| p.snapshot().map(|log| log.meals))
            .collect()
    }
}

/// Joins every handle; reports the first failure after all are joined.
fn join_all(handles: Handles<'_>) -> Result<(), CoreError> {
    let mut first = None;
    for (who, handle) in handles {
        let result = match handle.join() {
            Ok(result) => result,
            Err(_) => Err(CoreError::Panicked(who)),
        };
        if let Err(err) = result {
            first.get_or_insert(err);
        }
    }
    first.map_or(Ok(()), Err)
}
