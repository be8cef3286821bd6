//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use finhealth_core::{
    DataCache, DataFrequency, FinancialStatement, KeyMetrics, PeriodType, Result, Symbol,
};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Key for OHLCV cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OhlcvKey {
    provider: String,
    symbol: Symbol,
    start: NaiveDate,
    end: NaiveDate,
    frequency: DataFrequency,
}

/// Key for financials cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FinancialsKey {
    provider: String,
    symbol: Symbol,
    period_type: PeriodType,
    limit: Option<usize>,
}

/// Key for metrics cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricsKey {
    provider: String,
    symbol: Symbol,
    date: NaiveDate,
}

/// In-process cache for one session.
///
/// Data is stored in `RwLock`-protected `HashMap`s and is lost when the cache
/// is dropped. Values are cloned on get/put.
///
/// Expiry policy: without a TTL, entries live as long as the cache. With a
/// TTL, an entry older than the TTL is a miss and is removed when read.
/// Entries never read again stay until [`DataCache::invalidate_stale`].
#[derive(Debug, Default)]
pub struct InMemoryCache {
    ttl: Option<Duration>,
    ohlcv: RwLock<HashMap<OhlcvKey, CacheEntry<DataFrame>>>,
    financials: RwLock<HashMap<FinancialsKey, CacheEntry<Vec<FinancialStatement>>>>,
    metrics: RwLock<HashMap<MetricsKey, CacheEntry<KeyMetrics>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache whose entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty in-memory cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    /// Configured time-to-live, if any.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Total number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.ohlcv.read().await.len()
            + self.financials.read().await.len()
            + self.metrics.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns a fresh entry, evicting it instead when it has expired.
    async fn lookup<K, T>(
        &self,
        map: &RwLock<HashMap<K, CacheEntry<T>>>,
        key: &K,
        kind: &str,
    ) -> Option<T>
    where
        K: Eq + Hash,
        T: Clone,
    {
        {
            let cache = map.read().await;
            match cache.get(key) {
                Some(entry) if !self.is_expired(entry) => {
                    debug!("Cache hit for {}", kind);
                    return Some(entry.data.clone());
                }
                Some(_) => {}
                None => {
                    debug!("Cache miss for {}", kind);
                    return None;
                }
            }
        }

        // Re-check under the write lock; a put may have refreshed it
        let mut cache = map.write().await;
        if cache.get(key).is_some_and(|entry| self.is_expired(entry)) {
            cache.remove(key);
            debug!("Evicted expired cache entry for {}", kind);
        }
        None
    }

    fn is_expired<T>(&self, entry: &CacheEntry<T>) -> bool {
        self.ttl.is_some_and(|ttl| entry.is_stale(ttl))
    }
}

#[async_trait]
impl DataCache for InMemoryCache {
    #[instrument(skip(self), fields(provider = %provider, symbol = %symbol))]
    async fn get_ohlcv(
        &self,
        provider: &str,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
    ) -> Result<Option<DataFrame>> {
        let key = OhlcvKey {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            start,
            end,
            frequency,
        };

        Ok(self.lookup(&self.ohlcv, &key, "OHLCV data").await)
    }

    #[instrument(skip(self, data), fields(provider = %provider, symbol = %symbol))]
    async fn put_ohlcv(
        &self,
        provider: &str,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
        frequency: DataFrequency,
        data: &DataFrame,
    ) -> Result<()> {
        let key = OhlcvKey {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            start,
            end,
            frequency,
        };

        let mut cache = self.ohlcv.write().await;
        cache.insert(key, CacheEntry::new(data.clone()));
        debug!("Cached {} OHLCV rows", data.height());
        Ok(())
    }

    #[instrument(skip(self), fields(provider = %provider, symbol = %symbol))]
    async fn get_financials(
        &self,
        provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Option<Vec<FinancialStatement>>> {
        let key = FinancialsKey {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            period_type,
            limit,
        };

        Ok(self.lookup(&self.financials, &key, "financials").await)
    }

    #[instrument(skip(self, statements), fields(provider = %provider, symbol = %symbol, count = statements.len()))]
    async fn put_financials(
        &self,
        provider: &str,
        symbol: &Symbol,
        limit: Option<usize>,
        statements: &[FinancialStatement],
    ) -> Result<()> {
        // Group statements by period type
        let mut quarterly: Vec<FinancialStatement> = Vec::new();
        let mut annual: Vec<FinancialStatement> = Vec::new();

        for stmt in statements {
            match stmt.period_type {
                PeriodType::Quarterly => quarterly.push(stmt.clone()),
                PeriodType::Annual => annual.push(stmt.clone()),
            }
        }

        let mut cache = self.financials.write().await;

        for (period_type, group) in [(PeriodType::Quarterly, quarterly), (PeriodType::Annual, annual)] {
            if group.is_empty() {
                continue;
            }
            let key = FinancialsKey {
                provider: provider.to_string(),
                symbol: symbol.clone(),
                period_type,
                limit,
            };
            cache.insert(key, CacheEntry::new(group));
        }

        debug!("Cached {} financial statements", statements.len());
        Ok(())
    }

    #[instrument(skip(self), fields(provider = %provider, symbol = %symbol))]
    async fn get_metrics(
        &self,
        provider: &str,
        symbol: &Symbol,
        date: NaiveDate,
    ) -> Result<Option<KeyMetrics>> {
        let key = MetricsKey {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            date,
        };

        Ok(self.lookup(&self.metrics, &key, "metrics").await)
    }

    #[instrument(skip(self, metrics), fields(provider = %provider, symbol = %symbol))]
    async fn put_metrics(
        &self,
        provider: &str,
        symbol: &Symbol,
        metrics: &KeyMetrics,
    ) -> Result<()> {
        let key = MetricsKey {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            date: metrics.date,
        };

        let mut cache = self.metrics.write().await;
        cache.insert(key, CacheEntry::new(metrics.clone()));
        debug!("Cached metrics");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut total_removed = 0usize;

        {
            let mut cache = self.ohlcv.write().await;
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_stale(ttl));
            total_removed += before - cache.len();
        }

        {
            let mut cache = self.financials.write().await;
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_stale(ttl));
            total_removed += before - cache.len();
        }

        {
            let mut cache = self.metrics.write().await;
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_stale(ttl));
            total_removed += before - cache.len();
        }

        if total_removed > 0 {
            debug!("Invalidated {} stale cache entries", total_removed);
        }

        Ok(total_removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.ohlcv.write().await.clear();
        self.financials.write().await.clear();
        self.metrics.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_memory_cache_ohlcv() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 5);

        let result = cache
            .get_ohlcv("test", &symbol, start, end, DataFrequency::Daily)
            .await
            .unwrap();
        assert!(result.is_none());

        let df = DataFrame::new(vec![
            Column::new("symbol".into(), vec!["AAPL", "AAPL"]),
            Column::new("close".into(), vec![151.0, 152.0]),
        ])
        .unwrap();

        cache
            .put_ohlcv("test", &symbol, start, end, DataFrequency::Daily, &df)
            .await
            .unwrap();

        let hit = cache
            .get_ohlcv("test", &symbol, start, end, DataFrequency::Daily)
            .await
            .unwrap();
        assert_eq!(hit.map(|df| df.height()), Some(2));

        // Same range at another frequency is a different entry
        let other = cache
            .get_ohlcv("test", &symbol, start, end, DataFrequency::Weekly)
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_financials_grouped_by_period() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("MSFT");

        let statements = vec![
            FinancialStatement::new(symbol.clone(), date(2024, 6, 30), PeriodType::Annual),
            FinancialStatement::new(symbol.clone(), date(2024, 9, 30), PeriodType::Quarterly),
            FinancialStatement::new(symbol.clone(), date(2023, 6, 30), PeriodType::Annual),
        ];
        cache.put_financials("test", &symbol, None, &statements).await.unwrap();

        let annual = cache
            .get_financials("test", &symbol, PeriodType::Annual, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(annual.len(), 2);

        let quarterly = cache
            .get_financials("test", &symbol, PeriodType::Quarterly, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quarterly.len(), 1);

        // Provider name namespaces entries
        assert!(
            cache
                .get_financials("other", &symbol, PeriodType::Annual, None)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_memory_cache_metrics() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");
        let day = date(2024, 1, 15);

        let metrics = KeyMetrics {
            market_cap: Some(3_000_000_000_000.0),
            pe_ratio: Some(28.5),
            ..KeyMetrics::new(symbol.clone(), day)
        };

        cache.put_metrics("test", &symbol, &metrics).await.unwrap();

        let retrieved = cache.get_metrics("test", &symbol, day).await.unwrap().unwrap();
        assert_eq!(retrieved.market_cap, Some(3_000_000_000_000.0));
    }

    #[tokio::test]
    async fn test_ttl_expiry_on_read() {
        let cache = InMemoryCache::with_ttl(Duration::from_millis(1));
        let symbol = Symbol::new("AAPL");
        let day = date(2024, 1, 15);

        cache
            .put_metrics("test", &symbol, &KeyMetrics::new(symbol.clone(), day))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(cache.get_metrics("test", &symbol, day).await.unwrap().is_none());
        // The expired entry was evicted by the read
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_financials_keyed_by_limit() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");
        let one = vec![FinancialStatement::new(symbol.clone(), date(2024, 9, 30), PeriodType::Annual)];

        cache.put_financials("test", &symbol, Some(1), &one).await.unwrap();

        let hit = cache
            .get_financials("test", &symbol, PeriodType::Annual, Some(1))
            .await
            .unwrap();
        assert_eq!(hit.map(|s| s.len()), Some(1));

        for limit in [Some(3), None] {
            let miss = cache
                .get_financials("test", &symbol, PeriodType::Annual, limit)
                .await
                .unwrap();
            assert!(miss.is_none());
        }
    }

    #[tokio::test]
    async fn test_invalidate_stale() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");
        let day = date(2024, 1, 15);

        cache
            .put_metrics("test", &symbol, &KeyMetrics::new(symbol.clone(), day))
            .await
            .unwrap();

        let removed = cache.invalidate_stale(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(removed, 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = cache.invalidate_stale(Duration::from_millis(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");
        let day = date(2024, 1, 15);

        cache
            .put_metrics("test", &symbol, &KeyMetrics::new(symbol.clone(), day))
            .await
            .unwrap();

        cache.clear().await.unwrap();

        assert!(cache.get_metrics("test", &symbol, day).await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }
}
