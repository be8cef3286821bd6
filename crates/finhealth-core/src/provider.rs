//! Provider traits for fetching market data.
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`PriceDataProvider`] - OHLCV price history
//! - [`FundamentalDataProvider`] - Financial statements and market metrics

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::{
    error::Result,
    frequency::{DataFrequency, PeriodType},
    types::{FinancialStatement, KeyMetrics, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    ///
    /// The name is also used as the cache namespace.
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Returns the price frequencies supported by this provider.
    fn supported_frequencies(&self) -> &[DataFrequency];
}

/// Provider for OHLCV price history.
#[async_trait]
pub trait PriceDataProvider: DataProvider {
    /// Fetches OHLCV data for a single symbol.
    ///
    /// Returns a DataFrame with columns: symbol, date, open, high, low, close,
    /// volume, adjusted_close, sorted by date ascending.
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
    ) -> Result<DataFrame>;
}

/// Provider for fundamental financial data.
#[async_trait]
pub trait FundamentalDataProvider: DataProvider {
    /// Fetches financial statements for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The stock symbol
    /// * `period_type` - Annual or Quarterly
    /// * `limit` - Maximum number of periods to return (most recent first)
    async fn fetch_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FinancialStatement>>;

    /// Fetches the current market and valuation metrics for a symbol.
    ///
    /// `date` stamps the returned metrics and keys them in caches.
    async fn fetch_metrics(&self, symbol: &Symbol, date: NaiveDate) -> Result<KeyMetrics>;
}
