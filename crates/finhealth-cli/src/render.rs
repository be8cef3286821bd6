//! Text rendering of a health report.

use std::fmt::Write;

use finhealth::{HealthVerdict, Outcome, PriceSummary, RatioKind, RatioSet, ScoringPolicy};

pub(crate) const fn marker(outcome: Outcome) -> char {
    match outcome {
        Outcome::Pass => '+',
        Outcome::Fail => '-',
        Outcome::Indeterminate => '?',
    }
}

pub(crate) fn price_summary(summary: &PriceSummary) -> String {
    let change = summary
        .change()
        .map_or_else(|| "n/a".to_string(), |c| format!("{:+.1}%", c * 100.0));

    format!(
        "{} to {}: close {:.2} -> {:.2} ({}), range {:.2}-{:.2} over {} sessions",
        summary.start,
        summary.end,
        summary.first_close,
        summary.last_close,
        change,
        summary.low,
        summary.high,
        summary.sessions
    )
}

pub(crate) fn latest_ratios(ratios: &RatioSet) -> String {
    let mut out = String::new();
    for (kind, value) in ratios.iter() {
        // Pass-throughs only show when reported
        if !kind.is_core() && !value.is_available() {
            continue;
        }
        let _ = writeln!(out, "  {:<26} {}", kind.name(), value);
    }
    out
}

pub(crate) fn strategy(policy: ScoringPolicy) -> String {
    let strategy = policy.strategy();
    format!("{}: {}", strategy.name(), strategy.description())
}

pub(crate) fn verdict(verdict: &HealthVerdict) -> String {
    let mut out = format!(
        "{} [{}, {}/{}]\n",
        verdict.summary,
        verdict.policy.strategy().name(),
        verdict.score,
        verdict.max_score
    );
    for observation in &verdict.observations {
        let _ = writeln!(out, "  {} {}", marker(observation.outcome), observation.text);
    }
    out
}

/// Ratio kinds whose absence is worth a hint on stderr.
pub(crate) fn missing_core(ratios: &RatioSet) -> Vec<RatioKind> {
    RatioKind::CORE
        .iter()
        .copied()
        .filter(|&kind| !ratios.get(kind).is_available())
        .collect()
}
