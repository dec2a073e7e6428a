use crate::philosopher::PhilosopherId;
use serde::Serialize;

/// Terminal result of a whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A philosopher starved. `at_ms` is the printed death time when the
    /// launcher observed it directly.
    Death {
        philosopher: PhilosopherId,
        at_ms: Option<u64>,
    },
    /// Every philosopher reached the meal goal, or the goal was zero
    Sated,
    /// A time limit passed with every philosopher alive
    Survived,
    /// Stopped from outside before reaching a verdict
    Interrupted,
}

impl Outcome {
    pub fn is_death(&self) -> bool {
        matches!(self, Outcome::Death { .. })
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Death {
                philosopher,
                at_ms: Some(at),
            } => write!(f, "philosopher {philosopher} died at {at} ms"),
            Outcome::Death { philosopher, .. } => write!(f, "philosopher {philosopher} died"),
            Outcome::Sated => write!(f, "every philosopher ate enough"),
            Outcome::Survived => write!(f, "time limit reached, nobody died"),
            Outcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let death = Outcome::Death {
            philosopher: PhilosopherId::new(3).unwrap(),
            at_ms: Some(311),
        };
        let json = serde_json::to_value(death).unwrap();

        assert_eq!(json["kind"], "death");
        assert_eq!(json["philosopher"], 3);
        assert_eq!(json["at_ms"], 311);
        assert_eq!(serde_json::to_value(Outcome::Sated).unwrap()["kind"], "sated");
        assert_eq!(serde_json::to_value(Outcome::Survived).unwrap()["kind"], "survived");
    }

    #[test]
    fn test_outcome_display() {
        let death = Outcome::Death {
            philosopher: PhilosopherId::new(1).unwrap(),
            at_ms: None,
        };
        assert_eq!(death.to_string(), "philosopher 1 died");
        assert!(death.is_death());
        assert!(!Outcome::Interrupted.is_death());
    }
}
