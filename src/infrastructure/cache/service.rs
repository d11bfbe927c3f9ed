//! Cache service trait and error types.

use async_trait::async_trait;
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for the redirect cache: key → destination with explicit TTL, plus
/// a separate click-counter namespace used to decide cache-refresh cadence.
///
/// The cache holds no authority. Implementations must be fail-open: runtime
/// errors are logged and degrade to a miss (or a zero counter), never
/// disrupting resolution. There is no transactional guarantee with the
/// durable store; entries are always safe to evict or miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, production
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process, tests and
///   single-node deployments
/// - [`crate::infrastructure::cache::NullCache`] - no-op, caching disabled
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached destination for a code or alias.
    ///
    /// Returns `Ok(None)` on miss or on backend error (fail-open).
    async fn get_url(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a destination with a TTL in seconds (implementation default
    /// when `None`).
    async fn set_url(
        &self,
        key: &str,
        destination: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes the cached destination and the click counter for a key.
    /// Deleting an absent key is a no-op.
    async fn invalidate(&self, key: &str) -> CacheResult<()>;

    /// Increments the click counter for a key and returns the new count.
    ///
    /// Returns `Ok(0)` on backend error so that a degraded cache never
    /// forces store revalidation on its own.
    async fn increment_clicks(&self, key: &str) -> CacheResult<u64>;

    /// Zeroes the click counter for a key. Called when the destination
    /// entry is (re)populated, so the revalidation threshold counts clicks
    /// since the last cache population.
    async fn reset_clicks(&self, key: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}
