//! In-process cache implementation backed by moka.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cached destination with its optional per-entry TTL override.
#[derive(Clone)]
struct CachedUrl {
    destination: String,
    ttl: Option<Duration>,
}

/// Expiry policy: the entry's own TTL when set, the cache default otherwise.
struct PerEntryExpiry {
    default_ttl: Duration,
}

impl Expiry<String, CachedUrl> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.default_ttl))
    }
}

/// In-memory cache with per-entry expiry and sharded click counters.
///
/// Suitable for tests and single-node deployments without Redis. Entries
/// expire `ttl` after insertion unless [`CacheService::set_url`] carries a
/// per-call override.
pub struct MemoryCache {
    urls: Cache<String, CachedUrl>,
    clicks: DashMap<String, u64>,
}

impl MemoryCache {
    /// Creates a cache holding up to `max_capacity` destinations with the
    /// given default time-to-live.
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let urls = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry { default_ttl: ttl })
            .build();

        Self {
            urls,
            clicks: DashMap::new(),
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.urls.get(key).await.map(|e| e.destination))
    }

    async fn set_url(
        &self,
        key: &str,
        destination: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let entry = CachedUrl {
            destination: destination.to_string(),
            ttl: ttl_seconds.map(Duration::from_secs),
        };
        self.urls.insert(key.to_string(), entry).await;
        debug!("Cache SET: {} -> {}", key, destination);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.urls.invalidate(key).await;
        self.clicks.remove(key);
        Ok(())
    }

    async fn increment_clicks(&self, key: &str) -> CacheResult<u64> {
        let mut entry = self.clicks.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn reset_clicks(&self, key: &str) -> CacheResult<()> {
        self.clicks.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
