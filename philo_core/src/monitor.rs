//! Liveness checks: the central monitor and the per-unit watchdog.

use crate::config::{Rules, POLL_INTERVAL};
use crate::error::CoreError;
use crate::herald::Herald;
use crate::philosopher::{MealLog, Philosopher, PhilosopherId};
use crate::stop::StopFlag;
use crate::unit::UnitExit;
use philo_env::Clock;
use std::time::Duration;
use tracing::{debug, info};

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// `who` starved; detected at clock reading `at`
    Death { who: PhilosopherId, at: Duration },
    /// Every philosopher reached the meal goal
    Sated,
    /// Someone else set the stop flag first
    Halted,
}

/// True if `log` has gone strictly longer than `time_to_die` without a meal
/// start. Unseeded and sated philosophers are never starving.
pub fn is_starving(log: &MealLog, rules: &Rules, now: Duration) -> bool {
    if rules.is_sated(log.meals) {
        return false;
    }
    match log.last_meal {
        Some(last) => now.saturating_sub(last) > rules.time_to_die(),
        None => false,
    }
}

/// Position in `logs` of the first starving philosopher.
pub fn find_starving(
    logs: &[(PhilosopherId, MealLog)],
    rules: &Rules,
    now: Duration,
) -> Option<usize> {
    logs.iter().position(|(_, log)| is_starving(log, rules, now))
}

/// True when a goal is configured and every log has reached it.
pub fn all_sated(logs: &[(PhilosopherId, MealLog)], rules: &Rules) -> bool {
    rules.meal_goal().is_some() && logs.iter().all(|(_, log)| rules.is_sated(log.meals))
}

/// Checks `philosopher` again with its log locked and, if it is still
/// starving, announces its death before the lock is released. A meal start
/// cannot slip in between the check and the death line.
///
/// Returns the detection time of a confirmed death.
pub fn confirm_death<C, H>(
    clock: &C,
    rules: &Rules,
    philosopher: &Philosopher,
    herald: &H,
) -> Result<Option<Duration>, CoreError>
where
    C: Clock + ?Sized,
    H: Herald + ?Sized,
{
    philosopher.with_log(|log| {
        let now = clock.now();
        if !is_starving(log, rules, now) {
            return Ok(None);
        }
        herald.proclaim_death(philosopher.id(), now)?;
        Ok(Some(now))
    })
}

/// Central observer of the shared-memory model.
pub struct Monitor<'a, C: ?Sized, H: ?Sized> {
    pub clock: &'a C,
    pub rules: &'a Rules,
    pub philosophers: &'a [Philosopher],
    pub herald: &'a H,
    pub stop: &'a StopFlag,
}

impl<C, H> Monitor<'_, C, H>
where
    C: Clock + ?Sized,
    H: Herald + ?Sized,
{
    /// Polls every philosopher until a terminal condition. The only
    /// component that sets the stop flag in a healthy run.
    pub fn watch(&self) -> Result<Verdict, CoreError> {
        let mut logs = Vec::with_capacity(self.philosophers.len());
        loop {
            if self.stop.observe() {
                return Ok(Verdict::Halted);
            }

            let now = self.clock.now();
            logs.clear();
            for philosopher in self.philosophers {
                logs.push((philosopher.id(), philosopher.snapshot()?));
            }

            if let Some(index) = find_starving(&logs, self.rules, now) {
                let philosopher = &self.philosophers[index];
                let who = philosopher.id();
                if let Some(at) = confirm_death(self.clock, self.rules, philosopher, self.herald)? {
                    self.stop.trigger();
                    info!(philosopher = %who, "death detected");
                    return Ok(Verdict::Death { who, at });
                }
                debug!(philosopher = %who, "meal started before the death was confirmed");
                continue;
            }
            if all_sated(&logs, self.rules) {
                self.stop.trigger();
                info!("every philosopher reached the meal goal");
                return Ok(Verdict::Sated);
            }

            self.clock.pause(POLL_INTERVAL);
        }
    }
}

/// Ends the unit a watchdog belongs to.
pub trait Terminator: Send + Sync {
    /// Called once, after the death line is written. The process
    /// implementation never returns.
    fn terminate(&self, exit: UnitExit);
}

/// Watches a single philosopher of the isolated-memory model.
pub struct Watchdog<'a, C: ?Sized, H: ?Sized, T: ?Sized> {
    pub clock: &'a C,
    pub rules: &'a Rules,
    pub philosopher: &'a Philosopher,
    pub herald: &'a H,
    pub stop: &'a StopFlag,
    pub terminator: &'a T,
}

impl<C, H, T> Watchdog<'_, C, H, T>
where
    C: Clock + ?Sized,
    H: Herald + ?Sized,
    T: Terminator + ?Sized,
{
    /// Returns true if the philosopher died, false if the unit stopped for
    /// another reason.
    pub fn watch(&self) -> Result<bool, CoreError> {
        let who = self.philosopher.id();
        loop {
            if self.stop.observe() {
                debug!(philosopher = %who, "watchdog released");
                return Ok(false);
            }

            let died = confirm_death(self.clock, self.rules, self.philosopher, self.herald)?;
            if died.is_some() {
                self.stop.trigger();
                self.terminator.terminate(UnitExit::Died);
                return Ok(true);
            }

            self.clock.pause(POLL_INTERVAL);
        }
    }
}
