//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Key prefix for cached destinations.
const URL_PREFIX: &str = "cache:";
/// Key prefix for the click counters, a separate namespace from `views`.
const CLICKS_PREFIX: &str = "clicks:";

/// Redis cache for fast redirect lookups.
///
/// Uses `ConnectionManager` for connection reuse and reconnects. All
/// operations are fail-open: errors are logged but never propagate to
/// callers, so a Redis outage degrades resolution to store-only behavior.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and
    /// configures the default TTL applied when [`CacheService::set_url`]
    /// is called with `ttl_seconds = None`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
        })
    }

    fn url_key(key: &str) -> String {
        format!("{}{}", URL_PREFIX, key)
    }

    fn clicks_key(key: &str) -> String {
        format!("{}{}", CLICKS_PREFIX, key)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(Self::url_key(key)).await {
            Ok(Some(url)) => {
                debug!("Cache HIT: {} -> {}", key, url);
                Ok(Some(url))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        key: &str,
        destination: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        match conn
            .set_ex::<_, _, ()>(Self::url_key(key), destination, ttl)
            .await
        {
            Ok(_) => {
                debug!("Cache SET: {} -> {} (TTL: {}s)", key, destination, ttl);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        match conn
            .del::<_, i32>(&[Self::url_key(key), Self::clicks_key(key)])
            .await
        {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", key);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", key, e);
                Ok(())
            }
        }
    }

    async fn increment_clicks(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.client.clone();
        let clicks_key = Self::clicks_key(key);

        match conn.incr::<_, _, u64>(&clicks_key, 1u64).await {
            Ok(count) => {
                // Fresh counters get their own TTL, independent of the
                // destination entry.
                if count == 1 {
                    if let Err(e) = conn
                        .expire::<_, ()>(&clicks_key, self.default_ttl as i64)
                        .await
                    {
                        warn!("Redis EXPIRE error for {}: {}", key, e);
                    }
                }
                Ok(count)
            }
            Err(e) => {
                warn!("Redis INCR error for {}: {}", key, e);
                Ok(0)
            }
        }
    }

    async fn reset_clicks(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        if let Err(e) = conn.del::<_, i32>(Self::clicks_key(key)).await {
            warn!("Redis DEL error for {}: {}", key, e);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
