//! Validated simulation rules.

use crate::error::ConfigError;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Largest table the simulation accepts.
pub const MAX_PHILOSOPHERS: u64 = 200;

/// Delay before an even-numbered philosopher's first acquisition attempt.
pub const STARTUP_STAGGER: Duration = Duration::from_millis(1);

/// Interval at which monitors and watchdogs sample the philosophers.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Immutable configuration of one run.
///
/// Only constructible through [`Rules::new`], so every `Rules` value in the
/// engine has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rules {
    /// Number of philosophers, and therefore forks (1-200)
    philosophers: usize,

    /// Longest allowed gap between two meal starts
    #[serde(rename = "time_to_die_ms", serialize_with = "as_millis")]
    time_to_die: Duration,

    /// Time spent eating, both forks held
    #[serde(rename = "time_to_eat_ms", serialize_with = "as_millis")]
    time_to_eat: Duration,

    /// Time spent sleeping after a meal
    #[serde(rename = "time_to_sleep_ms", serialize_with = "as_millis")]
    time_to_sleep: Duration,

    /// Meals every philosopher must eat before the run succeeds (None = unbounded)
    meal_goal: Option<u32>,

    /// Whether odd-sized tables stretch the think phase
    balance_odd_ring: bool,
}

impl Rules {
    /// Validates raw millisecond values into rules.
    ///
    /// # Arguments
    /// * `philosophers` - table size, 1 to 200
    /// * `die_ms`, `eat_ms`, `sleep_ms` - positive durations in milliseconds
    /// * `meal_goal` - optional meals per philosopher; 0 ends the run at once
    pub fn new(
        philosophers: u64,
        die_ms: u64,
        eat_ms: u64,
        sleep_ms: u64,
        meal_goal: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_PHILOSOPHERS).contains(&philosophers) {
            return Err(ConfigError::PhilosopherCount(philosophers));
        }
        let meal_goal = meal_goal
            .map(|goal| u32::try_from(goal).map_err(|_| ConfigError::MealGoalOutOfRange(goal)))
            .transpose()?;

        Ok(Self {
            philosophers: philosophers as usize,
            time_to_die: millis("time_to_die", die_ms)?,
            time_to_eat: millis("time_to_eat", eat_ms)?,
            time_to_sleep: millis("time_to_sleep", sleep_ms)?,
            meal_goal,
            balance_odd_ring: true,
        })
    }

    /// Enables or disables the odd-table think-time stretch.
    pub fn with_odd_balance(mut self, enabled: bool) -> Self {
        self.balance_odd_ring = enabled;
        self
    }

    /// Returns the number of philosophers.
    pub fn philosophers(&self) -> usize {
        self.philosophers
    }

    /// Returns the death deadline.
    pub fn time_to_die(&self) -> Duration {
        self.time_to_die
    }

    /// Returns the eating duration.
    pub fn time_to_eat(&self) -> Duration {
        self.time_to_eat
    }

    /// Returns the sleeping duration.
    pub fn time_to_sleep(&self) -> Duration {
        self.time_to_sleep
    }

    /// Returns the meal goal, if any.
    pub fn meal_goal(&self) -> Option<u32> {
        self.meal_goal
    }

    /// Returns true if odd tables stretch the think phase.
    pub fn balances_odd_ring(&self) -> bool {
        self.balance_odd_ring
    }

    /// True when a single philosopher sits alone with one fork.
    pub fn is_solo(&self) -> bool {
        self.philosophers == 1
    }

    /// True when the goal is already met before anyone eats.
    pub fn goal_is_trivial(&self) -> bool {
        self.meal_goal == Some(0)
    }

    /// True when `meals` satisfies the configured goal.
    pub fn is_sated(&self, meals: u32) -> bool {
        self.meal_goal.is_some_and(|goal| meals >= goal)
    }

    /// Length of the think phase.
    ///
    /// Zero on even tables. On odd tables, half of whatever the death
    /// deadline leaves after eating and sleeping, which keeps the ring from
    /// drifting into a rhythm where the same neighbour always loses.
    pub fn think_time(&self) -> Duration {
        if !self.balance_odd_ring || self.philosophers % 2 == 0 {
            return Duration::ZERO;
        }
        self.time_to_die
            .saturating_sub(self.time_to_eat + self.time_to_sleep)
            / 2
    }
}

fn as_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

fn millis(name: &'static str, value: u64) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    if value > u64::from(u32::MAX) {
        return Err(ConfigError::DurationOutOfRange { name, value });
    }
    Ok(Duration::from_millis(value))
}
