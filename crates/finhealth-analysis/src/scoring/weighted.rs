//! Weighted 0-100 score strategy.
//!
//! Reads the provider-reported fields rather than the computed ratios.
//! Return on equity is compared as a fraction (0.15 is 15%), the same
//! convention the tally uses. Debt to equity stays on the provider's raw
//! percent-like scale (150 is 1.5x) because it is a different field from the
//! computed balance-sheet ratio.
//!
//! Rules compare the values as reported, before rounding, so a 0.4% margin
//! still counts as profitable.

use super::{HealthVerdict, Rule, ScoringPolicy, ScoringStrategy, Threshold, Tier};
use crate::ratios::{RatioKind, RatioSet};

/// Starting score before any rule is applied.
const BASELINE: u32 = 50;

/// Score cap.
const MAX_SCORE: u32 = 100;

const RULES: [Rule; 4] = [
    Rule {
        ratio: RatioKind::ReportedProfitMargin,
        threshold: Threshold::Above(0.0),
        points: 15,
        pass: "Company is profitable",
        fail: "Company is not profitable",
        unknown: "Profit margin not reported",
    },
    Rule {
        ratio: RatioKind::ReportedReturnOnEquity,
        threshold: Threshold::Above(0.15),
        points: 15,
        pass: "Return on equity above 15%",
        fail: "Return on equity at or below 15%",
        unknown: "Return on equity not reported",
    },
    Rule {
        ratio: RatioKind::ReportedDebtToEquity,
        threshold: Threshold::Below(150.0),
        points: 10,
        pass: "Debt to equity below 150",
        fail: "Debt to equity at or above 150",
        unknown: "Debt to equity not reported",
    },
    Rule {
        ratio: RatioKind::PriceToEarnings,
        threshold: Threshold::Below(30.0),
        points: 10,
        pass: "Valuation is reasonable (P/E below 30)",
        fail: "Valuation is stretched (P/E of 30 or more)",
        unknown: "P/E not reported",
    },
];

/// Baseline-plus-bonus score in the 50-100 range.
///
/// Starts at 50 and adds 15 for a positive profit margin, 15 for return on
/// equity above 0.15, 10 for reported debt to equity below 150 and 10 for a
/// trailing P/E below 30. Scores of 75 and up are [`Tier::Strong`], 50 to 74
/// [`Tier::Moderate`], anything lower [`Tier::Weak`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedScore;

impl WeightedScore {
    /// Maps a score to its tier.
    #[must_use]
    pub const fn tier(score: u32) -> Tier {
        if score >= 75 {
            Tier::Strong
        } else if score >= 50 {
            Tier::Moderate
        } else {
            Tier::Weak
        }
    }

    /// Fixed description of a tier.
    #[must_use]
    pub const fn summary(tier: Tier) -> &'static str {
        match tier {
            Tier::Strong => "The company shows strong financial health with solid fundamentals.",
            Tier::Moderate => "The company shows moderate financial health with some areas to watch.",
            Tier::Weak => "The company shows weak financial health and warrants caution.",
        }
    }
}

impl ScoringStrategy for WeightedScore {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::Weighted
    }

    fn name(&self) -> &str {
        "Weighted Score"
    }

    fn description(&self) -> &str {
        "Baseline of 50 plus weighted bonuses for profitability, returns, leverage and valuation"
    }

    fn score(&self, ratios: &RatioSet) -> HealthVerdict {
        let mut score = BASELINE;
        let mut observations = Vec::with_capacity(RULES.len());

        for rule in &RULES {
            let (points, observation) = rule.evaluate_unrounded(ratios);
            score += points;
            observations.push(observation);
        }

        let score = score.min(MAX_SCORE);
        let tier = Self::tier(score);

        HealthVerdict {
            policy: ScoringPolicy::Weighted,
            score,
            max_score: MAX_SCORE,
            tier,
            summary: Self::summary(tier).to_string(),
            observations,
        }
    }
}
