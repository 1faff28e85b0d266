use crate::core::cache::Cache;
use crate::core::{Asset, FxRateProvider, FxRateTable, TreasuryPayload, TreasuryProvider};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const FX_RATES_CACHE_KEY: &str = "usd_fx_rates";

pub fn treasury_cache_key(asset: Asset) -> String {
    format!("treasury_{}", asset.id())
}

/// Serves treasury payloads from a cache, falling through to `inner` on a miss.
/// Only successful fetches are cached; expired entries are swept before each insert.
pub struct CachingTreasuryProvider<T: TreasuryProvider> {
    inner: T,
    cache: Arc<dyn Cache<String, TreasuryPayload>>,
    ttl: Duration,
}

impl<T: TreasuryProvider> CachingTreasuryProvider<T> {
    pub fn new(inner: T, cache: Arc<dyn Cache<String, TreasuryPayload>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<T: TreasuryProvider> TreasuryProvider for CachingTreasuryProvider<T> {
    async fn fetch_treasury(&self, asset: Asset) -> Result<TreasuryPayload> {
        let key = treasury_cache_key(asset);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Serving {} treasury data from cache", asset);
            return Ok(cached);
        }

        let payload = self.inner.fetch_treasury(asset).await?;
        self.cache.evict_expired().await;
        self.cache.put(key, payload.clone(), Some(self.ttl)).await;
        Ok(payload)
    }
}

/// Cache wrapper for [`FxRateProvider`].
pub struct CachingFxRateProvider<T: FxRateProvider> {
    inner: T,
    cache: Arc<dyn Cache<String, FxRateTable>>,
    ttl: Duration,
}

impl<T: FxRateProvider> CachingFxRateProvider<T> {
    pub fn new(inner: T, cache: Arc<dyn Cache<String, FxRateTable>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<T: FxRateProvider> FxRateProvider for CachingFxRateProvider<T> {
    async fn fetch_rates(&self) -> Result<FxRateTable> {
        let key = FX_RATES_CACHE_KEY.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Serving FX rates from cache");
            return Ok(cached);
        }

        let rates = self.inner.fetch_rates().await?;
        self.cache.evict_expired().await;
        self.cache.put(key, rates.clone(), Some(self.ttl)).await;
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCache;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockTreasuryProvider {
        call_count: AtomicUsize,
    }

    impl MockTreasuryProvider {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<'a> TreasuryProvider for &'a MockTreasuryProvider {
        async fn fetch_treasury(&self, asset: Asset) -> Result<TreasuryPayload> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match asset {
                Asset::Bitcoin => Ok(TreasuryPayload::from_value(json!({
                    "companies": [{ "name": "Strategy", "total_holdings": 638460 }]
                }))),
                Asset::Ethereum => Err(anyhow!("Service unavailable")),
            }
        }
    }

    struct CountingFxProvider {
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl<'a> FxRateProvider for &'a CountingFxProvider {
        async fn fetch_rates(&self) -> Result<FxRateTable> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(FxRateTable::from_usd_rates(vec![("EUR", 0.9)]))
        }
    }

    #[tokio::test]
    async fn test_caching_treasury_provider() {
        let inner_provider = MockTreasuryProvider::new();
        let cache = Arc::new(MemoryCache::<String, TreasuryPayload>::new());
        let caching_provider =
            CachingTreasuryProvider::new(&inner_provider, cache.clone(), Duration::from_secs(3600));

        // First call - should hit inner provider
        let first = caching_provider.fetch_treasury(Asset::Bitcoin).await.unwrap();
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);

        // Second call - should be cached
        let second = caching_provider.fetch_treasury(Asset::Bitcoin).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);
        assert!(cache.get(&"treasury_bitcoin".to_string()).await.is_some());

        // Failures are not cached
        assert!(caching_provider.fetch_treasury(Asset::Ethereum).await.is_err());
        assert!(caching_provider.fetch_treasury(Asset::Ethereum).await.is_err());
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_caching_treasury_provider_refetches_after_ttl() {
        let inner_provider = MockTreasuryProvider::new();
        let cache = Arc::new(MemoryCache::<String, TreasuryPayload>::new());
        let caching_provider =
            CachingTreasuryProvider::new(&inner_provider, cache, Duration::from_millis(10));

        caching_provider.fetch_treasury(Asset::Bitcoin).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        caching_provider.fetch_treasury(Asset::Bitcoin).await.unwrap();

        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_caching_fx_provider() {
        let inner_provider = CountingFxProvider {
            call_count: AtomicUsize::new(0),
        };
        let cache = Arc::new(MemoryCache::<String, FxRateTable>::new());
        let caching_provider =
            CachingFxRateProvider::new(&inner_provider, cache, Duration::from_secs(3600));

        let first = caching_provider.fetch_rates().await.unwrap();
        let second = caching_provider.fetch_rates().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.rate("EUR"), 0.9);
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);
    }
}
