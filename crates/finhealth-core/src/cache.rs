//! Cache trait for storing fetched financial data.
//!
//! The [`DataCache`] trait is injected into the fetch layer so that repeated
//! analysis of the same ticker within a session does not hit the network
//! again. Expiry is owned by each implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::time::Duration;

use crate::{
    error::Result,
    frequency::{DataFrequency, PeriodType},
    types::{FinancialStatement, KeyMetrics, Symbol},
};

/// Trait for caching fetched financial data.
///
/// Entries are namespaced by provider name so that two providers never
/// answer for each other.
#[async_trait]
pub trait DataCache: Send + Sync {
    /// Retrieves cached OHLCV data for a symbol, date range and frequency.
    ///
    /// Returns `Ok(Some(df))` if cached data exists, `Ok(None)` if not cached.
    async fn get_ohlcv(
        &self,
        provider: &str,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
    ) -> Result<Option<DataFrame>>;

    /// Stores OHLCV data in the cache under the requested range.
    async fn put_ohlcv(
        &self,
        provider: &str,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
        data: &DataFrame,
    ) -> Result<()>;

    /// Retrieves cached financial statements for a symbol.
    ///
    /// `limit` is part of the key: an answer fetched with one limit never
    /// serves a request with another.
    ///
    /// Returns `Ok(Some(statements))` if cached, `Ok(None)` if not cached.
    async fn get_financials(
        &self,
        provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Option<Vec<FinancialStatement>>>;

    /// Stores financial statements fetched with `limit` in the cache.
    async fn put_financials(
        &self,
        provider: &str,
        symbol: &Symbol,
        limit: Option<usize>,
        statements: &[FinancialStatement],
    ) -> Result<()>;

    /// Retrieves cached key metrics for a symbol on a specific date.
    ///
    /// Returns `Ok(Some(metrics))` if cached, `Ok(None)` if not cached.
    async fn get_metrics(
        &self,
        provider: &str,
        symbol: &Symbol,
        date: NaiveDate,
    ) -> Result<Option<KeyMetrics>>;

    /// Stores key metrics in the cache.
    async fn put_metrics(&self, provider: &str, symbol: &Symbol, metrics: &KeyMetrics)
    -> Result<()>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Implementations may also evict expired entries on read; this sweeps
    /// the ones never read again.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
