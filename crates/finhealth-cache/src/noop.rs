//! Cache that stores nothing.

use async_trait::async_trait;
use chrono::NaiveDate;
use finhealth_core::{
    DataCache, DataFrequency, FinancialStatement, KeyMetrics, PeriodType, Result, Symbol,
};
use polars::prelude::DataFrame;
use std::time::Duration;
use tracing::trace;

/// A cache that never holds anything.
///
/// Every lookup misses and every store is discarded. Used when caching is
/// disabled so the fetch path stays the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataCache for NoopCache {
    async fn get_ohlcv(
        &self,
        _provider: &str,
        symbol: &Symbol,
        _start: NaiveDate,
        _end: NaiveDate,
        _frequency: DataFrequency,
    ) -> Result<Option<DataFrame>> {
        trace!(%symbol, "caching disabled, OHLCV miss");
        Ok(None)
    }

    async fn put_ohlcv(
        &self,
        _provider: &str,
        _symbol: &Symbol,
        _start: NaiveDate,
        _end: NaiveDate,
        _frequency: DataFrequency,
        _data: &DataFrame,
    ) -> Result<()> {
        Ok(())
    }

    async fn get_financials(
        &self,
        _provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
        _limit: Option<usize>,
    ) -> Result<Option<Vec<FinancialStatement>>> {
        trace!(%symbol, %period_type, "caching disabled, financials miss");
        Ok(None)
    }

    async fn put_financials(
        &self,
        _provider: &str,
        _symbol: &Symbol,
        _limit: Option<usize>,
        _statements: &[FinancialStatement],
    ) -> Result<()> {
        Ok(())
    }

    async fn get_metrics(
        &self,
        _provider: &str,
        symbol: &Symbol,
        _date: NaiveDate,
    ) -> Result<Option<KeyMetrics>> {
        trace!(%symbol, "caching disabled, metrics miss");
        Ok(None)
    }

    async fn put_metrics(
        &self,
        _provider: &str,
        _symbol: &Symbol,
        _metrics: &KeyMetrics,
    ) -> Result<()> {
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_returns_stored_data() {
        let cache = NoopCache::new();
        let symbol = Symbol::new("AAPL");
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        cache
            .put_metrics("test", &symbol, &KeyMetrics::new(symbol.clone(), day))
            .await
            .unwrap();
        assert!(cache.get_metrics("test", &symbol, day).await.unwrap().is_none());

        let statements = vec![FinancialStatement::new(symbol.clone(), day, PeriodType::Annual)];
        cache.put_financials("test", &symbol, None, &statements).await.unwrap();
        assert!(
            cache
                .get_financials("test", &symbol, PeriodType::Annual, None)
                .await
                .unwrap()
                .is_none()
        );

        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
    }
}
