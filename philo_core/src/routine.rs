//! The philosopher action loop.
//!
//! acquiring -> eating -> releasing -> sleeping -> thinking -> acquiring ...

use crate::config::{Rules, POLL_INTERVAL, STARTUP_STAGGER};
use crate::error::CoreError;
use crate::herald::{Event, Herald};
use crate::nap::{nap, SleepOutcome};
use crate::philosopher::Philosopher;
use crate::protocol::{put_down_forks, take_forks};
use crate::ring::ForkRing;
use crate::stop::StopFlag;
use crate::unit::UnitExit;
use philo_env::{Clock, CountingSemaphore};
use tracing::debug;

/// Everything one philosopher needs to live its life.
pub struct Routine<'a, C: ?Sized, S, H: ?Sized> {
    clock: &'a C,
    rules: &'a Rules,
    ring: &'a ForkRing<S>,
    herald: &'a H,
    philosopher: &'a Philosopher,
    stop: &'a StopFlag,
}

impl<'a, C, S, H> Routine<'a, C, S, H>
where
    C: Clock + ?Sized,
    S: CountingSemaphore,
    H: Herald + ?Sized,
{
    pub fn new(
        clock: &'a C,
        rules: &'a Rules,
        ring: &'a ForkRing<S>,
        herald: &'a H,
        philosopher: &'a Philosopher,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            clock,
            rules,
            ring,
            herald,
            philosopher,
            stop,
        }
    }

    /// Delays an even-numbered philosopher's first attempt.
    pub fn stagger(&self) {
        if self.philosopher.id().is_even() {
            nap(self.clock, STARTUP_STAGGER, self.stop);
        }
    }

    /// One full meal: take both forks, eat, put them down. Returns the meal
    /// count after this meal, or `None` if the run stopped before the meal
    /// could be announced. Such a meal is neither counted nor timed.
    pub fn eat(&self) -> Result<Option<u32>, CoreError> {
        take_forks(self.ring, self.philosopher, self.herald)?;
        let meal = self.hold_meal();
        let released = put_down_forks(self.ring, self.philosopher);
        let meals = meal?;
        released?;
        Ok(meals)
    }

    fn hold_meal(&self) -> Result<Option<u32>, CoreError> {
        let who = self.philosopher.id();
        let started = self
            .philosopher
            .start_meal(self.clock.now(), || self.herald.proclaim(who, Event::Eating))?;
        if !started {
            debug!(philosopher = %who, "stopped before eating");
            return Ok(None);
        }
        nap(self.clock, self.rules.time_to_eat(), self.stop);
        self.philosopher.finish_meal().map(Some)
    }

    /// Sleeps after a meal.
    pub fn rest(&self) -> Result<(), CoreError> {
        self.herald.proclaim(self.philosopher.id(), Event::Sleeping)?;
        nap(self.clock, self.rules.time_to_sleep(), self.stop);
        Ok(())
    }

    /// Thinks until the next acquisition attempt.
    pub fn think(&self) -> Result<(), CoreError> {
        self.herald.proclaim(self.philosopher.id(), Event::Thinking)?;
        let think = self.rules.think_time();
        if !think.is_zero() {
            nap(self.clock, think, self.stop);
        }
        Ok(())
    }

    /// The lone philosopher: one fork, no meal, held until death.
    pub fn solo(&self) -> Result<(), CoreError> {
        let who = self.philosopher.id();
        let fork = self.philosopher.seat().left;

        self.ring.take(fork, who)?;
        let announced = self.herald.proclaim(who, Event::TakenFork);
        nap(self.clock, self.rules.time_to_die(), self.stop);
        self.ring.put_down(fork, who)?;
        announced.map(|_| ())
    }

    /// Shared-memory loop. Returns once the stop flag is observed.
    ///
    /// A philosopher that reaches the meal goal puts its forks down and
    /// waits for the global stop without eating again.
    pub fn run_shared(&self) -> Result<(), CoreError> {
        if self.rules.goal_is_trivial() {
            return Ok(());
        }
        if self.rules.is_solo() {
            return self.solo();
        }

        self.stagger();
        while !self.stop.observe() {
            let Some(meals) = self.eat()? else {
                break;
            };
            if self.rules.is_sated(meals) {
                debug!(philosopher = %self.philosopher.id(), meals, "sated");
                self.wait_for_stop();
                break;
            }
            self.rest()?;
            self.think()?;
        }
        Ok(())
    }

    /// Isolated-memory loop.
    ///
    /// Ends with [`UnitExit::Sated`] right after the goal meal's forks are
    /// down, or with [`UnitExit::Died`] once the unit's stop flag is set,
    /// which only its own watchdog does.
    pub fn run_isolated(&self) -> Result<UnitExit, CoreError> {
        if self.rules.goal_is_trivial() {
            return Ok(UnitExit::Sated);
        }
        if self.rules.is_solo() {
            self.solo()?;
            self.wait_for_stop();
            return Ok(UnitExit::Died);
        }

        self.stagger();
        loop {
            if self.stop.observe() {
                return Ok(UnitExit::Died);
            }
            let Some(meals) = self.eat()? else {
                return Ok(UnitExit::Died);
            };
            if self.rules.is_sated(meals) {
                return Ok(UnitExit::Sated);
            }
            self.rest()?;
            self.think()?;
        }
    }

    fn wait_for_stop(&self) {
        while nap(self.clock, POLL_INTERVAL, self.stop) == SleepOutcome::Completed {}
    }
}
