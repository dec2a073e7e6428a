//! Named parameter presets and the outcome each one must reach.

use philo_core::{ConfigError, Outcome, Rules};
use serde::Serialize;
use std::time::Duration;

/// What a preset is expected to end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Someone dies, within the given printed-time window in ms
    Death { within: (u64, u64) },
    /// Nobody dies; the run goes on until interrupted
    Survives,
    /// Everyone reaches the meal goal
    Sated,
}

impl Expectation {
    /// Checks a finished run. The error explains the mismatch.
    pub fn check(&self, outcome: &Outcome) -> Result<(), String> {
        match (self, outcome) {
            (_, Outcome::Interrupted) => Err("run was interrupted before a verdict".to_string()),
            (
                Expectation::Death { within: (min, max) },
                Outcome::Death {
                    at_ms: Some(at), ..
                },
            ) => {
                if (*min..=*max).contains(at) {
                    Ok(())
                } else {
                    Err(format!("death at {at} ms, expected {min}-{max} ms"))
                }
            }
            // The process launcher learns who died but not when.
            (Expectation::Death { .. }, Outcome::Death { at_ms: None, .. }) => Ok(()),
            (Expectation::Death { .. }, other) => Err(format!("expected a death, {other}")),
            (Expectation::Survives, Outcome::Survived | Outcome::Sated) => Ok(()),
            (Expectation::Sated, Outcome::Sated) => Ok(()),
            (_, Outcome::Death { .. }) => Err(format!("unexpected death: {outcome}")),
            (Expectation::Sated, other) => Err(format!("expected every philosopher sated, {other}")),
        }
    }
}

/// A run checked against its preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    #[serde(rename = "name")]
    pub scenario: ScenarioId,

    /// Whether the outcome matched the expectation
    pub passed: bool,

    /// Failure message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ScenarioResult {
    pub fn evaluate(scenario: ScenarioId, outcome: &Outcome) -> Self {
        let checked = scenario.expectation().check(outcome);
        Self {
            scenario,
            passed: checked.is_ok(),
            failure_reason: checked.err(),
        }
    }
}

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// One philosopher, one fork
    Solo,

    /// Two philosophers with plenty of slack
    Pair,

    /// Two philosophers whose cycle exactly fills the deadline
    TightPair,

    /// Four philosophers where eating and sleeping overrun the deadline
    CrowdedFour,

    /// Four philosophers with a small margin
    RoomyFour,

    /// Odd ring with the think-time balance
    OddFive,

    /// Odd ring with a meal goal
    SatedFive,

    /// 200 philosophers
    Banquet,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Solo,
            ScenarioId::Pair,
            ScenarioId::TightPair,
            ScenarioId::CrowdedFour,
            ScenarioId::RoomyFour,
            ScenarioId::OddFive,
            ScenarioId::SatedFive,
            ScenarioId::Banquet,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Solo => "solo",
            ScenarioId::Pair => "pair",
            ScenarioId::TightPair => "tight_pair",
            ScenarioId::CrowdedFour => "crowded_four",
            ScenarioId::RoomyFour => "roomy_four",
            ScenarioId::OddFive => "odd_five",
            ScenarioId::SatedFive => "sated_five",
            ScenarioId::Banquet => "banquet",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Solo => "1 800 200 200: takes its only fork and dies at 800 ms",
            ScenarioId::Pair => "2 400 100 100: two philosophers alternate forever",
            ScenarioId::TightPair => "2 200 100 100: the cycle fills the deadline exactly",
            ScenarioId::CrowdedFour => "4 310 200 100: a neighbour waits 400 ms, dies at ~310 ms",
            ScenarioId::RoomyFour => "4 410 200 200: 10 ms of margin, nobody dies",
            ScenarioId::OddFive => "5 800 200 200: odd ring kept alive by think-time balance",
            ScenarioId::SatedFive => "5 800 200 200 7: stops once everyone ate 7 meals",
            ScenarioId::Banquet => "200 800 200 200: stress test with 200 philosophers",
        }
    }

    /// Raw arguments: philosophers, die, eat, sleep, meal goal.
    pub fn params(&self) -> (u64, u64, u64, u64, Option<u64>) {
        match self {
            ScenarioId::Solo => (1, 800, 200, 200, None),
            ScenarioId::Pair => (2, 400, 100, 100, None),
            ScenarioId::TightPair => (2, 200, 100, 100, None),
            ScenarioId::CrowdedFour => (4, 310, 200, 100, None),
            ScenarioId::RoomyFour => (4, 410, 200, 200, None),
            ScenarioId::OddFive => (5, 800, 200, 200, None),
            ScenarioId::SatedFive => (5, 800, 200, 200, Some(7)),
            ScenarioId::Banquet => (200, 800, 200, 200, None),
        }
    }

    pub fn expectation(&self) -> Expectation {
        match self {
            ScenarioId::Solo => Expectation::Death { within: (790, 810) },
            ScenarioId::CrowdedFour => Expectation::Death { within: (300, 320) },
            ScenarioId::SatedFive => Expectation::Sated,
            _ => Expectation::Survives,
        }
    }

    /// How long the run may last. A preset expected to survive passes by
    /// reaching this limit alive.
    pub fn time_limit(&self) -> Duration {
        match self {
            ScenarioId::SatedFive => Duration::from_secs(10),
            ScenarioId::Banquet => Duration::from_secs(30),
            _ => Duration::from_secs(5),
        }
    }

    /// Validated rules for this preset.
    pub fn rules(&self) -> Result<Rules, ConfigError> {
        let (n, die, eat, sleep, meals) = self.params();
        Rules::new(n, die, eat, sleep, meals)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "solo" => Ok(ScenarioId::Solo),
            "pair" => Ok(ScenarioId::Pair),
            "tight_pair" => Ok(ScenarioId::TightPair),
            "crowded_four" => Ok(ScenarioId::CrowdedFour),
            "roomy_four" => Ok(ScenarioId::RoomyFour),
            "odd_five" => Ok(ScenarioId::OddFive),
            "sated_five" => Ok(ScenarioId::SatedFive),
            "banquet" => Ok(ScenarioId::Banquet),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
