//! Threshold tally strategy.

use super::{HealthVerdict, Rule, ScoringPolicy, ScoringStrategy, Threshold, Tier};
use crate::ratios::{RatioKind, RatioSet};

const RULES: [Rule; 4] = [
    Rule {
        ratio: RatioKind::NetProfitMargin,
        threshold: Threshold::Above(0.10),
        points: 1,
        pass: "Healthy profitability",
        fail: "Weak profit margins",
        unknown: "Profitability could not be assessed",
    },
    Rule {
        ratio: RatioKind::ReturnOnEquity,
        threshold: Threshold::Above(0.15),
        points: 1,
        pass: "Strong return on equity",
        fail: "Low return on equity",
        unknown: "Return on equity could not be assessed",
    },
    Rule {
        ratio: RatioKind::DebtToEquity,
        threshold: Threshold::Below(1.5),
        points: 1,
        pass: "Debt levels are manageable",
        fail: "High leverage risk",
        unknown: "Leverage could not be assessed",
    },
    Rule {
        ratio: RatioKind::CurrentRatio,
        threshold: Threshold::Above(1.2),
        points: 1,
        pass: "Good short-term liquidity",
        fail: "Liquidity risk",
        unknown: "Liquidity could not be assessed",
    },
];

/// Categorical tally over the four computed ratios.
///
/// One point each for net profit margin > 0.10, return on equity > 0.15,
/// debt to equity < 1.5 and current ratio > 1.2. Zero or one point is
/// [`Tier::Weak`], two is [`Tier::Moderate`], three or four is [`Tier::Strong`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdTally;

impl ThresholdTally {
    /// Maps a point total to its tier.
    #[must_use]
    pub const fn tier(points: u32) -> Tier {
        match points {
            0 | 1 => Tier::Weak,
            2 => Tier::Moderate,
            _ => Tier::Strong,
        }
    }
}

impl ScoringStrategy for ThresholdTally {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::Tally
    }

    fn name(&self) -> &str {
        "Threshold Tally"
    }

    fn description(&self) -> &str {
        "One point per passed criterion across profitability, returns, leverage and liquidity"
    }

    fn score(&self, ratios: &RatioSet) -> HealthVerdict {
        let mut score = 0;
        let mut observations = Vec::with_capacity(RULES.len());

        for rule in &RULES {
            let (points, observation) = rule.evaluate(ratios);
            score += points;
            observations.push(observation);
        }

        let tier = Self::tier(score);

        HealthVerdict {
            policy: ScoringPolicy::Tally,
            score,
            max_score: RULES.len() as u32,
            tier,
            summary: format!("{tier} Financial Health"),
            observations,
        }
    }
}
