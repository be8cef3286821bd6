//! Health scoring strategies and verdict types.
//!
//! Two strategies implement [`ScoringStrategy`]:
//!
//! - [`ThresholdTally`] - one point per passed criterion, 0 to 4
//! - [`WeightedScore`] - baseline 50 plus weighted bonuses, capped at 100
//!
//! [`ScoringPolicy`] names them so the choice can come from configuration.
//! Ratios marked unavailable never award or cost points; they produce an
//! [`Outcome::Indeterminate`] observation instead.

use std::fmt;
use std::str::FromStr;

use finhealth_core::DataError;
use serde::{Deserialize, Serialize};

use crate::ratios::{RatioKind, RatioSet};

mod tally;
mod weighted;

pub use tally::ThresholdTally;
pub use weighted::WeightedScore;

/// Categorical health bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Weak financial health.
    Weak,
    /// Moderate financial health.
    Moderate,
    /// Strong financial health.
    Strong,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weak => f.write_str("Weak"),
            Self::Moderate => f.write_str("Moderate"),
            Self::Strong => f.write_str("Strong"),
        }
    }
}

/// Result of evaluating one rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The rule was met.
    Pass,
    /// The rule was not met.
    Fail,
    /// The input ratio was unavailable; the rule was skipped.
    Indeterminate,
}

/// One line of explanation attached to a verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Ratio the rule looked at.
    pub ratio: RatioKind,
    /// Rule outcome.
    pub outcome: Outcome,
    /// Human-readable text.
    pub text: String,
}

/// Score, tier and observations produced by a strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthVerdict {
    /// Strategy that produced this verdict.
    pub policy: ScoringPolicy,
    /// Numeric score.
    pub score: u32,
    /// Highest score the strategy can produce.
    pub max_score: u32,
    /// Categorical tier.
    pub tier: Tier,
    /// One-line description of the tier.
    pub summary: String,
    /// One observation per rule, in rule order.
    pub observations: Vec<Observation>,
}

impl HealthVerdict {
    /// Number of observations with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.observations
            .iter()
            .filter(|o| o.outcome == outcome)
            .count()
    }
}

/// Trait for health scoring strategies.
///
/// Implementations are pure: the verdict depends only on the ratio set.
pub trait ScoringStrategy: Send + Sync + fmt::Debug {
    /// Policy this strategy implements.
    fn policy(&self) -> ScoringPolicy;

    /// Short name of the strategy.
    fn name(&self) -> &str;

    /// Description of how the score is built.
    fn description(&self) -> &str;

    /// Scores a ratio set.
    fn score(&self, ratios: &RatioSet) -> HealthVerdict;
}

/// Named scoring strategy, selectable by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Four-criterion threshold tally.
    #[default]
    Tally,
    /// 0-100 weighted score.
    Weighted,
}

impl ScoringPolicy {
    /// Returns the strategy implementing this policy.
    #[must_use]
    pub fn strategy(self) -> &'static dyn ScoringStrategy {
        match self {
            Self::Tally => &ThresholdTally,
            Self::Weighted => &WeightedScore,
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tally => f.write_str("tally"),
            Self::Weighted => f.write_str("weighted"),
        }
    }
}

impl FromStr for ScoringPolicy {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tally" | "threshold" | "a" => Ok(Self::Tally),
            "weighted" | "score" | "b" => Ok(Self::Weighted),
            other => Err(DataError::InvalidParameter(format!(
                "unknown scoring policy '{other}' (expected 'tally' or 'weighted')"
            ))),
        }
    }
}

/// Scores ratio sets with a configured policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealthScorer {
    policy: ScoringPolicy,
}

impl HealthScorer {
    /// Creates a scorer for the given policy.
    #[must_use]
    pub const fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Configured policy.
    #[must_use]
    pub const fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    /// Scores a ratio set.
    #[must_use]
    pub fn score(&self, ratios: &RatioSet) -> HealthVerdict {
        self.policy.strategy().score(ratios)
    }
}

/// Comparison a rule applies to its ratio. Both bounds are strict.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    fn is_met(self, value: f64) -> bool {
        match self {
            Self::Above(bound) => value > bound,
            Self::Below(bound) => value < bound,
        }
    }
}

/// A single scoring rule with its observation texts.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Rule {
    pub(crate) ratio: RatioKind,
    pub(crate) threshold: Threshold,
    pub(crate) points: u32,
    pub(crate) pass: &'static str,
    pub(crate) fail: &'static str,
    pub(crate) unknown: &'static str,
}

impl Rule {
    /// Evaluates the rule against the rounded ratio, returning the points
    /// earned and the observation.
    pub(crate) fn evaluate(&self, ratios: &RatioSet) -> (u32, Observation) {
        self.judge(ratios.get(self.ratio).value())
    }

    /// Evaluates the rule against the ratio before rounding.
    pub(crate) fn evaluate_unrounded(&self, ratios: &RatioSet) -> (u32, Observation) {
        self.judge(ratios.unrounded(self.ratio))
    }

    fn judge(&self, value: Option<f64>) -> (u32, Observation) {
        let (points, outcome, text) = match value {
            Some(v) if self.threshold.is_met(v) => (self.points, Outcome::Pass, self.pass),
            Some(_) => (0, Outcome::Fail, self.fail),
            None => (0, Outcome::Indeterminate, self.unknown),
        };

        (
            points,
            Observation {
                ratio: self.ratio,
                outcome,
                text: text.to_string(),
            },
        )
    }
}
