//! End-to-end analysis of one ticker.

use chrono::{NaiveDate, TimeDelta, Utc};
use finhealth_analysis::{HealthScorer, RatioEngine};
use finhealth_core::{DataError, FinancialSnapshot, Symbol};
use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{AnalyzerConfig, DataProviderRegistry, HealthReport};

/// Longest accepted ticker.
const MAX_TICKER_LEN: usize = 20;

/// Errors returned by [`Analyzer::analyze`].
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The ticker is empty, too long or contains characters no exchange uses.
    #[error("Invalid ticker '{0}': expected 1-20 characters of letters, digits, '.', '^', '=' or '-'")]
    InvalidTicker(String),

    /// Financial statements could not be obtained or held no usable period.
    #[error("No financial data available for {symbol}: {source}")]
    DataUnavailable {
        /// The requested symbol.
        symbol: Symbol,
        /// What went wrong underneath.
        #[source]
        source: DataError,
    },
}

/// Checks a user-supplied ticker and normalises it to a [`Symbol`].
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidTicker`] unless the trimmed ticker is 1 to
/// 20 characters of `A-Z a-z 0-9 . ^ = -`.
pub fn validate_ticker(ticker: &str) -> Result<Symbol, AnalysisError> {
    let trimmed = ticker.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_TICKER_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));

    if valid {
        Ok(Symbol::new(trimmed))
    } else {
        Err(AnalysisError::InvalidTicker(ticker.to_string()))
    }
}

/// Fetches, computes and scores.
///
/// Statements are required. Market metrics and price history are best
/// effort: a failure is logged and the report is produced without them.
#[derive(Debug)]
pub struct Analyzer {
    registry: DataProviderRegistry,
    config: AnalyzerConfig,
    engine: RatioEngine,
    scorer: HealthScorer,
}

impl Analyzer {
    /// Creates an analyzer over an already populated registry.
    #[must_use]
    pub fn new(registry: DataProviderRegistry, config: AnalyzerConfig) -> Self {
        let scorer = HealthScorer::new(config.policy);
        Self {
            registry,
            config,
            engine: RatioEngine::new(),
            scorer,
        }
    }

    /// Creates an analyzer backed by Yahoo Finance, with an in-memory cache
    /// when caching is enabled.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn from_config(config: AnalyzerConfig) -> Self {
        use finhealth_cache::{InMemoryCache, NoopCache};
        use finhealth_core::DataCache;
        use std::sync::Arc;

        let cache: Arc<dyn DataCache> = if config.cache_enabled {
            Arc::new(InMemoryCache::with_ttl(config.cache_ttl))
        } else {
            Arc::new(NoopCache::new())
        };

        let registry = DataProviderRegistry::with_cache(cache).with_yahoo_provider(
            finhealth_yahoo::YahooProvider::with_rate_limit(config.rate_limit),
        );

        Self::new(registry, config)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &DataProviderRegistry {
        &self.registry
    }

    /// Analyzes a ticker as of today.
    ///
    /// # Errors
    ///
    /// See [`analyze_as_of`](Self::analyze_as_of).
    pub async fn analyze(&self, ticker: &str) -> Result<HealthReport, AnalysisError> {
        self.analyze_as_of(ticker, Utc::now().date_naive()).await
    }

    /// Analyzes a ticker with `as_of` as the metrics date and the end of the
    /// price window.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidTicker`] if the ticker fails validation.
    /// - [`AnalysisError::DataUnavailable`] if statements cannot be fetched,
    ///   are empty, or no period has every field the core ratios need.
    #[instrument(skip(self), fields(policy = %self.config.policy))]
    pub async fn analyze_as_of(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<HealthReport, AnalysisError> {
        let symbol = validate_ticker(ticker)?;
        let unavailable = |source: DataError| AnalysisError::DataUnavailable {
            symbol: symbol.clone(),
            source,
        };

        let statements = self
            .registry
            .fetch_financials(&symbol, self.config.period_type, Some(self.config.periods))
            .await
            .map_err(unavailable)?;
        if statements.is_empty() {
            return Err(unavailable(DataError::unavailable(
                &symbol,
                format!("provider returned no {} statements", self.config.period_type),
            )));
        }

        let metrics = match self.registry.fetch_metrics(&symbol, as_of).await {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Market metrics unavailable, continuing without");
                None
            }
        };

        let prices = self.fetch_prices(&symbol, as_of).await;

        let mut snapshots: Vec<FinancialSnapshot> =
            statements.iter().map(FinancialSnapshot::from_statement).collect();
        snapshots.sort_by_key(FinancialSnapshot::period_end);

        let trend = self
            .engine
            .compute_series(&symbol, &snapshots)
            .map_err(unavailable)?;

        // Ties keep input order, so the last snapshot with the newest date is
        // the one the trend kept.
        let newest_end = trend.latest().and_then(|set| set.period_end());
        let mut latest_snapshot = snapshots
            .iter()
            .rev()
            .find(|s| s.period_end() == newest_end)
            .cloned()
            .unwrap_or_default();
        if let Some(metrics) = &metrics {
            latest_snapshot = latest_snapshot.with_metrics(metrics);
        }

        let latest = self.engine.compute(&latest_snapshot);
        let verdict = self.scorer.score(&latest);

        info!(
            symbol = %symbol,
            periods = trend.len(),
            score = verdict.score,
            tier = %verdict.tier,
            "Analysis complete"
        );

        Ok(HealthReport {
            symbol,
            snapshots,
            trend,
            latest,
            verdict,
            prices,
        })
    }

    async fn fetch_prices(&self, symbol: &Symbol, as_of: NaiveDate) -> Option<DataFrame> {
        if self.config.price_days == 0 {
            debug!(symbol = %symbol, "Price history disabled");
            return None;
        }

        let start = as_of - TimeDelta::days(i64::from(self.config.price_days));
        match self
            .registry
            .fetch_ohlcv(symbol, start, as_of, self.config.price_frequency)
            .await
        {
            Ok(df) => Some(df),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Price history unavailable, continuing without");
                None
            }
        }
    }
}
