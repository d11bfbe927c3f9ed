//! Redirect resolution service: the cache-aside hot path.

use std::sync::Arc;

use crate::domain::repositories::LinkRepository;
use crate::error::LinkError;
use crate::infrastructure::cache::CacheService;
use tracing::debug;

/// Default number of cached hits after which a lookup re-validates against
/// the durable store. Tunable via [`Resolver::with_revalidate_threshold`].
pub const DEFAULT_REVALIDATE_THRESHOLD: u64 = 3;

/// Resolves a short code or alias to its destination address.
///
/// Reads are cache-aside: the cache is consulted first and the durable
/// store only on miss, but click accounting always reaches the store (the
/// cache never substitutes for accounting). Once the click counter for a
/// key reaches the revalidation threshold since the last cache population,
/// the lookup re-reads the store even on a hit, bounding the staleness
/// window for expiration enforcement.
///
/// Cache failures degrade silently to store-only resolution; store
/// failures propagate as retryable [`LinkError::StoreUnavailable`].
pub struct Resolver<R: LinkRepository, C: CacheService> {
    repository: Arc<R>,
    cache: Arc<C>,
    cache_ttl_seconds: Option<u64>,
    revalidate_threshold: u64,
}

impl<R: LinkRepository, C: CacheService> Resolver<R, C> {
    /// Creates a resolver using the cache's default TTL and the default
    /// revalidation threshold.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            repository,
            cache,
            cache_ttl_seconds: None,
            revalidate_threshold: DEFAULT_REVALIDATE_THRESHOLD,
        }
    }

    /// Overrides the TTL applied when populating the cache.
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.cache_ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Overrides the click count at which a cached key is re-validated
    /// against the store.
    pub fn with_revalidate_threshold(mut self, threshold: u64) -> Self {
        self.revalidate_threshold = threshold.max(1);
        self
    }

    /// Resolves `key` (short code or custom alias) to a destination URL.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotFound`] - no matching live record
    /// - [`LinkError::Expired`] - the record's deadline has passed (checked
    ///   here as well as by the reaper, closing the race window between
    ///   expiration and the next sweep)
    /// - [`LinkError::StoreUnavailable`] - durable store unreachable
    pub async fn resolve(&self, key: &str) -> Result<String, LinkError> {
        if let Ok(Some(destination)) = self.cache.get_url(key).await {
            let clicks = self.cache.increment_clicks(key).await.unwrap_or(0);

            if clicks >= self.revalidate_threshold {
                debug!("revalidating '{}' after {} cached clicks", key, clicks);
                return self.resolve_from_store(key).await;
            }

            // The hit still pays for accounting: a durable views increment,
            // but no store read. A false return means the record was cleared
            // under the cache entry; fall through and let the store decide.
            if self.repository.increment_views_by_code(key).await? {
                return Ok(destination);
            }
        }

        self.resolve_from_store(key).await
    }

    /// Store-backed resolution: validates liveness, counts the view, and
    /// repopulates the cache.
    async fn resolve_from_store(&self, key: &str) -> Result<String, LinkError> {
        let Some(link) = self.repository.find_by_code(key).await? else {
            let _ = self.cache.invalidate(key).await;
            return Err(LinkError::NotFound(key.to_string()));
        };

        if link.is_expired() {
            let _ = self.cache.invalidate(key).await;
            return Err(LinkError::Expired(key.to_string()));
        }

        self.repository.increment_views(link.id).await?;

        let destination = link.long_url;
        let _ = self
            .cache
            .set_url(key, &destination, self.cache_ttl_seconds)
            .await;
        // The threshold counts clicks since the last population.
        let _ = self.cache.reset_clicks(key).await;
        let _ = self.cache.increment_clicks(key).await;

        Ok(destination)
    }
}
