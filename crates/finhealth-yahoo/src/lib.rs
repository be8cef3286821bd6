#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance data provider.
//!
//! [`YahooProvider`] implements the [`DataProvider`], [`PriceDataProvider`],
//! and [`FundamentalDataProvider`] traits from `finhealth-core`.
//!
//! # Example
//!
//! ```no_run
//! use finhealth_yahoo::YahooProvider;
//! use finhealth_core::{FundamentalDataProvider, PeriodType, Symbol};
//!
//! # async fn example() -> finhealth_core::Result<()> {
//! let provider = YahooProvider::new();
//! let symbol = Symbol::new("AAPL");
//!
//! let statements = provider
//!     .fetch_financials(&symbol, PeriodType::Annual, Some(4))
//!     .await?;
//! println!("Fetched {} periods", statements.len());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use finhealth_core::{
    DataError, DataFrequency, DataProvider, FinancialStatement, FundamentalDataProvider,
    KeyMetrics, PeriodType, PriceDataProvider, Result, Symbol,
};
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

mod chart;
mod quote_summary;

use chart::ChartResponse;
use quote_summary::QuoteSummaryResponse;

/// Default rate limit delay in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Back-off Yahoo asks for after a 429.
const RATE_LIMIT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`], [`PriceDataProvider`], and
/// [`FundamentalDataProvider`]. Requests made through one provider are spaced
/// at least `rate_limit` apart.
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Minimum spacing between requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now_millis().saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(now_millis(), Ordering::Relaxed);
    }

    /// Sends a rate-limited GET and decodes the JSON body.
    ///
    /// Yahoo answers unknown symbols with a 404 that carries an error payload,
    /// so the status is checked before decoding.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &Symbol) -> Result<T> {
        self.apply_rate_limit().await;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
                retry_after: Some(RATE_LIMIT_RETRY_AFTER),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {} for {}", status, symbol)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| DataError::Parse(e.to_string()))
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance price history, financial statements and market metrics"
    }

    fn supported_frequencies(&self) -> &[DataFrequency] {
        &[DataFrequency::Daily, DataFrequency::Weekly, DataFrequency::Monthly]
    }
}

#[async_trait]
impl PriceDataProvider for YahooProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        let url = chart::build_chart_url(symbol, start, end, frequency);
        let response: ChartResponse = self.get_json(&url, symbol).await?;
        let df = chart::parse_chart_response(symbol, response)?;

        debug!("Fetched {} price rows", df.height());
        Ok(df)
    }
}

#[async_trait]
impl FundamentalDataProvider for YahooProvider {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FinancialStatement>> {
        let url = quote_summary::statements_url(symbol, period_type);
        let response: QuoteSummaryResponse = self.get_json(&url, symbol).await?;

        let mut statements = quote_summary::parse_statements(symbol, period_type, response)?;
        if let Some(limit) = limit {
            statements.truncate(limit);
        }

        debug!("Fetched {} {} statements", statements.len(), period_type);
        Ok(statements)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_metrics(&self, symbol: &Symbol, date: NaiveDate) -> Result<KeyMetrics> {
        let url = quote_summary::metrics_url(symbol);
        let response: QuoteSummaryResponse = self.get_json(&url, symbol).await?;
        quote_summary::parse_metrics(symbol, date, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::new();

        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(
            provider
                .supported_frequencies()
                .contains(&DataFrequency::Daily)
        );
    }

    #[test]
    fn test_custom_rate_limit() {
        let provider = YahooProvider::with_rate_limit(Duration::from_millis(250));
        assert_eq!(provider.rate_limit(), Duration::from_millis(250));
        assert_eq!(YahooProvider::default().rate_limit(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_inverted_range_rejected_before_request() {
        let provider = YahooProvider::new();
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let err = provider
            .fetch_ohlcv(&Symbol::new("AAPL"), start, end, DataFrequency::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_spaces_requests() {
        let provider = YahooProvider::with_rate_limit(Duration::from_millis(50));

        let started = std::time::Instant::now();
        provider.apply_rate_limit().await;
        provider.apply_rate_limit().await;

        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
