#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the financial health checker.
//!
//! - [`FundamentalDataProvider`](provider::FundamentalDataProvider) - Financial statements and metrics
//! - [`PriceDataProvider`](provider::PriceDataProvider) - OHLCV price history
//! - [`DataCache`](cache::DataCache) - Caching abstraction for fetched data
//! - [`FinancialSnapshot`](types::FinancialSnapshot) - Input record for ratio computation

/// Cache trait for storing fetched data.
pub mod cache;
/// Error types for data operations.
pub mod error;
/// Data frequency and period type definitions.
pub mod frequency;
/// Provider traits for fetching market and fundamental data.
pub mod provider;
/// Core data types (Symbol, statements, metrics, snapshots).
pub mod types;

pub use cache::DataCache;
pub use error::{DataError, Result};
pub use frequency::{DataFrequency, PeriodType};
pub use provider::{DataProvider, FundamentalDataProvider, PriceDataProvider};
pub use types::{FinancialSnapshot, FinancialStatement, KeyMetrics, SnapshotField, Symbol};
