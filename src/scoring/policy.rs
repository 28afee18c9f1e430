//! Decision Policy
//!
//! Maps a default probability to a business decision with a fixed threshold.
//! The threshold is set once at startup; there is no per-request override.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Threshold used when none is configured
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Business decision for a credit application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Granted,
    Refused,
}

/// Refuse when the probability is strictly above the threshold.
///
/// `probability == threshold` is granted. Both sides are compared at `f32`
/// precision, the precision of model outputs, so an output of `0.3f32` is
/// equal to a configured threshold of `0.3`.
pub fn decide(probability: f64, threshold: f64) -> Decision {
    if (probability as f32) > (threshold as f32) {
        Decision::Refused
    } else {
        Decision::Granted
    }
}

/// Literal values written on the wire for each decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionLabels {
    /// `GRANTED` / `REFUSED`
    #[default]
    English,
    /// `ACCORDÉ` / `REFUSÉ`, as expected by older dashboards
    Legacy,
}

impl DecisionLabels {
    pub fn label(&self, decision: Decision) -> &'static str {
        match (self, decision) {
            (DecisionLabels::English, Decision::Granted) => "GRANTED",
            (DecisionLabels::English, Decision::Refused) => "REFUSED",
            (DecisionLabels::Legacy, Decision::Granted) => "ACCORDÉ",
            (DecisionLabels::Legacy, Decision::Refused) => "REFUSÉ",
        }
    }
}

impl FromStr for DecisionLabels {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(DecisionLabels::English),
            "legacy" | "fr" => Ok(DecisionLabels::Legacy),
            other => Err(format!("unknown decision label set '{}'", other)),
        }
    }
}

/// Threshold outside of [0, 1] or not a number
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidThreshold(pub f64);

impl fmt::Display for InvalidThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision threshold must be within [0, 1], got {}", self.0)
    }
}

impl std::error::Error for InvalidThreshold {}

/// Fixed-threshold decision policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, probability: f64) -> Decision {
        decide(probability, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_threshold() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.threshold(), 0.5);
    }

    #[test]
    fn test_boundary_is_granted() {
        assert_eq!(decide(0.5, 0.5), Decision::Granted);
        assert_eq!(decide(0.500001, 0.5), Decision::Refused);
        assert_eq!(decide(0.0, 0.0), Decision::Granted);
        assert_eq!(decide(1.0, 1.0), Decision::Granted);
    }

    #[test]
    fn test_model_precision_at_boundary() {
        // 0.3f32 widens to 0.30000001192...
        assert_eq!(decide(f64::from(0.3f32), 0.3), Decision::Granted);
        assert_eq!(decide(f64::from(0.7f32), 0.7), Decision::Granted);
        assert_eq!(decide(f64::from(0.3f32 + f32::EPSILON), 0.3), Decision::Refused);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(DecisionPolicy::new(-0.1).is_err());
        assert!(DecisionPolicy::new(1.5).is_err());
        assert!(DecisionPolicy::new(f64::NAN).is_err());
        assert!(DecisionPolicy::new(0.0).is_ok());
        assert!(DecisionPolicy::new(1.0).is_ok());
    }

    #[test]
    fn test_labels() {
        assert_eq!(DecisionLabels::English.label(Decision::Refused), "REFUSED");
        assert_eq!(DecisionLabels::Legacy.label(Decision::Granted), "ACCORDÉ");
        assert_eq!("legacy".parse::<DecisionLabels>(), Ok(DecisionLabels::Legacy));
        assert!("klingon".parse::<DecisionLabels>().is_err());
    }

    proptest! {
        #[test]
        fn refused_iff_above_threshold(p in 0.0f64..=1.0, t in 0.0f64..=1.0) {
            let refused = decide(p, t) == Decision::Refused;
            prop_assert_eq!(refused, (p as f32) > (t as f32));
        }

        #[test]
        fn decision_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, t in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(decide(lo, t) <= decide(hi, t));
        }
    }
}
