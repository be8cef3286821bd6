#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial ratio engine and health scoring strategies.
//!
//! Both components are stateless: the same input always produces the same
//! output, and nothing is carried between calls.

/// Ratio definitions and the ratio engine.
pub mod ratios;
/// Health scoring strategies and verdict types.
pub mod scoring;

pub use ratios::{RatioEngine, RatioKind, RatioSeries, RatioSet, RatioValue};
pub use scoring::{
    HealthScorer, HealthVerdict, Observation, Outcome, ScoringPolicy, ScoringStrategy,
    ThresholdTally, Tier, WeightedScore,
};
