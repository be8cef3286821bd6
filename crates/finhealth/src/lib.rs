#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial health checker.
//!
//! This crate ties the pieces together: it re-exports the core types, the
//! ratio engine and scoring strategies, the cache implementations and the
//! providers, and adds the [`Analyzer`] pipeline on top of a
//! [`DataProviderRegistry`].
//!
//! # Features
//!
//! - `yahoo` (default) - Yahoo Finance provider and [`Analyzer::from_config`]

// Core types and traits
pub use finhealth_core::*;

// Ratio engine and scoring
pub use finhealth_analysis::{
    HealthScorer, HealthVerdict, Observation, Outcome, RatioEngine, RatioKind, RatioSeries,
    RatioSet, RatioValue, ScoringPolicy, ScoringStrategy, ThresholdTally, Tier, WeightedScore,
};

// Cache implementations
pub use finhealth_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "yahoo")]
pub use finhealth_yahoo::YahooProvider;

mod analyzer;
mod config;
mod registry;
mod report;

#[cfg(test)]
mod testing;

pub use analyzer::{AnalysisError, Analyzer, validate_ticker};
pub use config::{
    AnalyzerConfig, ENV_CACHE, ENV_CACHE_TTL_SECS, ENV_PERIOD, ENV_PERIODS, ENV_POLICY,
    ENV_PRICE_DAYS, ENV_RATE_LIMIT_MS,
};
pub use registry::DataProviderRegistry;
pub use report::{HealthReport, PriceSummary};
