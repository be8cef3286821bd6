//! Data provider registry with cache and provider fallback.

use std::sync::Arc;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{debug, warn};

use finhealth_core::{
    DataCache, DataError, DataFrequency, FinancialStatement, FundamentalDataProvider, KeyMetrics,
    PeriodType, PriceDataProvider, Result, Symbol,
};

/// Registry of price and fundamental providers tried in registration order.
///
/// When a cache is set it is consulted before any provider and filled after
/// each successful fetch. Cache failures are logged and otherwise ignored, so
/// a broken cache degrades to a cache miss.
///
/// # Example
///
/// ```rust,ignore
/// use finhealth::{DataProviderRegistry, PeriodType, Symbol};
///
/// let registry = DataProviderRegistry::new().with_yahoo();
/// let statements = registry
///     .fetch_financials(&Symbol::new("AAPL"), PeriodType::Annual, Some(5))
///     .await?;
/// ```
#[derive(Default)]
pub struct DataProviderRegistry {
    price_providers: Vec<Arc<dyn PriceDataProvider>>,
    fundamental_providers: Vec<Arc<dyn FundamentalDataProvider>>,
    cache: Option<Arc<dyn DataCache>>,
}

impl std::fmt::Debug for DataProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let price: Vec<&str> = self.price_providers.iter().map(|p| p.name()).collect();
        let fundamental: Vec<&str> = self
            .fundamental_providers
            .iter()
            .map(|p| p.name())
            .collect();

        f.debug_struct("DataProviderRegistry")
            .field("price_providers", &price)
            .field("fundamental_providers", &fundamental)
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .finish()
    }
}

fn all_failed(last_error: Option<DataError>) -> DataError {
    last_error.unwrap_or_else(|| DataError::Other("All providers failed with no error".to_string()))
}

impl DataProviderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new registry with a cache.
    #[must_use]
    pub fn with_cache(cache: Arc<dyn DataCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Default::default()
        }
    }

    /// Set the cache for this registry.
    #[must_use]
    pub fn set_cache(mut self, cache: Arc<dyn DataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns true if a cache is set.
    #[must_use]
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Register a price data provider.
    pub fn register_price(&mut self, provider: Arc<dyn PriceDataProvider>) {
        debug!(provider = provider.name(), "Registering price provider");
        self.price_providers.push(provider);
    }

    /// Register a fundamental data provider.
    pub fn register_fundamental(&mut self, provider: Arc<dyn FundamentalDataProvider>) {
        debug!(provider = provider.name(), "Registering fundamental provider");
        self.fundamental_providers.push(provider);
    }

    /// Fetch OHLCV data, trying providers in order until one succeeds.
    pub async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
    ) -> Result<DataFrame> {
        if self.price_providers.is_empty() {
            return Err(DataError::ProviderNotConfigured(
                "No price providers registered".to_string(),
            ));
        }

        if let Some(cache) = &self.cache {
            for provider in &self.price_providers {
                match cache
                    .get_ohlcv(provider.name(), symbol, start, end, frequency)
                    .await
                {
                    Ok(Some(cached)) => {
                        debug!(provider = provider.name(), symbol = %symbol, "Cache hit for OHLCV data");
                        return Ok(cached);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Cache lookup failed for OHLCV data"),
                }
            }
        }

        let mut last_error = None;
        for provider in &self.price_providers {
            debug!(provider = provider.name(), symbol = %symbol, "Fetching OHLCV data");

            match provider.fetch_ohlcv(symbol, start, end, frequency).await {
                Ok(data) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache
                            .put_ohlcv(provider.name(), symbol, start, end, frequency, &data)
                            .await
                        {
                            warn!(provider = provider.name(), error = %e, "Failed to cache OHLCV data");
                        }
                    }
                    return Ok(data);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(all_failed(last_error))
    }

    /// Fetch financial statements, newest first, trying providers in order
    /// until one succeeds.
    pub async fn fetch_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FinancialStatement>> {
        if self.fundamental_providers.is_empty() {
            return Err(DataError::ProviderNotConfigured(
                "No fundamental providers registered".to_string(),
            ));
        }

        if let Some(cache) = &self.cache {
            for provider in &self.fundamental_providers {
                match cache.get_financials(provider.name(), symbol, period_type, limit).await {
                    Ok(Some(cached)) => {
                        debug!(provider = provider.name(), symbol = %symbol, "Cache hit for financials");
                        return Ok(cached);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Cache lookup failed for financials"),
                }
            }
        }

        let mut last_error = None;
        for provider in &self.fundamental_providers {
            debug!(provider = provider.name(), symbol = %symbol, %period_type, "Fetching financials");

            match provider.fetch_financials(symbol, period_type, limit).await {
                Ok(data) => {
                    // Empty answers are not cached
                    if let Some(cache) = self.cache.as_ref().filter(|_| !data.is_empty()) {
                        if let Err(e) = cache.put_financials(provider.name(), symbol, limit, &data).await {
                            warn!(provider = provider.name(), error = %e, "Failed to cache financials");
                        }
                    }
                    return Ok(data);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(all_failed(last_error))
    }

    /// Fetch key metrics for a symbol on a specific date.
    pub async fn fetch_metrics(&self, symbol: &Symbol, date: NaiveDate) -> Result<KeyMetrics> {
        if self.fundamental_providers.is_empty() {
            return Err(DataError::ProviderNotConfigured(
                "No fundamental providers registered".to_string(),
            ));
        }

        if let Some(cache) = &self.cache {
            for provider in &self.fundamental_providers {
                match cache.get_metrics(provider.name(), symbol, date).await {
                    Ok(Some(cached)) => {
                        debug!(provider = provider.name(), symbol = %symbol, "Cache hit for metrics");
                        return Ok(cached);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Cache lookup failed for metrics"),
                }
            }
        }

        let mut last_error = None;
        for provider in &self.fundamental_providers {
            debug!(provider = provider.name(), symbol = %symbol, "Fetching metrics");

            match provider.fetch_metrics(symbol, date).await {
                Ok(data) => {
                    if let Some(cache) = &self.cache {
                        if let Err(e) = cache.put_metrics(provider.name(), symbol, &data).await {
                            warn!(provider = provider.name(), error = %e, "Failed to cache metrics");
                        }
                    }
                    return Ok(data);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(all_failed(last_error))
    }

    /// Add the Yahoo Finance provider with the default rate limit.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(self) -> Self {
        self.with_yahoo_provider(finhealth_yahoo::YahooProvider::new())
    }

    /// Add a configured Yahoo Finance provider for prices and fundamentals.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo_provider(mut self, provider: finhealth_yahoo::YahooProvider) -> Self {
        let provider = Arc::new(provider);
        self.register_price(provider.clone());
        self.register_fundamental(provider);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, aapl_statements};
    use finhealth_cache::InMemoryCache;
    use std::sync::atomic::Ordering;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()
    }

    #[tokio::test]
    async fn test_empty_registry_is_not_configured() {
        let registry = DataProviderRegistry::new();
        let err = registry
            .fetch_financials(&Symbol::new("AAPL"), PeriodType::Annual, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::ProviderNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_next_provider() {
        let failing = Arc::new(MockProvider::failing("Broken"));
        let working = Arc::new(MockProvider::new("Working", aapl_statements()));

        let mut registry = DataProviderRegistry::new();
        registry.register_fundamental(failing.clone());
        registry.register_fundamental(working.clone());

        let statements = registry
            .fetch_financials(&Symbol::new("AAPL"), PeriodType::Annual, Some(2))
            .await
            .unwrap();

        assert_eq!(statements.len(), 2);
        assert_eq!(failing.financials_calls.load(Ordering::SeqCst), 1);
        assert_eq!(working.financials_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_surfaces_when_all_fail() {
        let mut registry = DataProviderRegistry::new();
        registry.register_fundamental(Arc::new(MockProvider::failing("Broken")));

        let err = registry
            .fetch_metrics(&Symbol::new("AAPL"), day())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Network(_)));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_requests() {
        let provider = Arc::new(MockProvider::new("Mock", aapl_statements()));
        let mut registry = DataProviderRegistry::with_cache(Arc::new(InMemoryCache::new()));
        registry.register_fundamental(provider.clone());
        let symbol = Symbol::new("AAPL");

        let first = registry
            .fetch_financials(&symbol, PeriodType::Annual, None)
            .await
            .unwrap();
        let second = registry
            .fetch_financials(&symbol, PeriodType::Annual, None)
            .await
            .unwrap();
        registry.fetch_metrics(&symbol, day()).await.unwrap();
        registry.fetch_metrics(&symbol, day()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.financials_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.metrics_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_financials_respect_limit() {
        let provider = Arc::new(MockProvider::new("Mock", aapl_statements()));
        let mut registry = DataProviderRegistry::with_cache(Arc::new(InMemoryCache::new()));
        registry.register_fundamental(provider);
        let symbol = Symbol::new("AAPL");

        registry
            .fetch_financials(&symbol, PeriodType::Annual, None)
            .await
            .unwrap();
        let limited = registry
            .fetch_financials(&symbol, PeriodType::Annual, Some(1))
            .await
            .unwrap();

        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_larger_limit_is_not_served_from_smaller_answer() {
        let provider = Arc::new(MockProvider::new("Mock", aapl_statements()));
        let mut registry = DataProviderRegistry::with_cache(Arc::new(InMemoryCache::new()));
        registry.register_fundamental(provider.clone());
        let symbol = Symbol::new("AAPL");

        let first = registry
            .fetch_financials(&symbol, PeriodType::Annual, Some(1))
            .await
            .unwrap();
        let second = registry
            .fetch_financials(&symbol, PeriodType::Annual, Some(3))
            .await
            .unwrap();
        let repeat = registry
            .fetch_financials(&symbol, PeriodType::Annual, Some(3))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 3);
        assert_eq!(repeat, second);
        assert_eq!(provider.financials_calls.load(Ordering::SeqCst), 2);
    }
}
