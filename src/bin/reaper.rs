//! Standalone expiration sweep worker.
//!
//! Connects to Postgres (and Redis when configured), then runs the
//! expiration reaper on its own timer until interrupted. Request-serving
//! processes share no in-process state with this worker; they meet only
//! through the store and the cache.

use std::sync::Arc;
use std::time::Duration;

use slink::application::services::ExpirationReaper;
use slink::config::Config;
use slink::infrastructure::cache::{CacheService, NullCache, RedisCache};
use slink::infrastructure::persistence::PgLinkRepository;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    info!("✓ Connected to Postgres");

    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool)));

    match &config.redis_url {
        Some(url) => match RedisCache::connect(url, config.cache_ttl_seconds).await {
            Ok(redis) => run_until_shutdown(repository, Arc::new(redis), &config).await,
            Err(e) => {
                warn!("Redis unavailable, sweeping store only: {}", e);
                run_until_shutdown(repository, Arc::new(NullCache::new()), &config).await
            }
        },
        None => run_until_shutdown(repository, Arc::new(NullCache::new()), &config).await,
    }

    Ok(())
}

async fn run_until_shutdown<C: CacheService + 'static>(
    repository: Arc<PgLinkRepository>,
    cache: Arc<C>,
    config: &Config,
) {
    if !cache.health_check().await {
        warn!("cache health check failed, sweeps will still clear the store");
    }

    let reaper = ExpirationReaper::new(repository, cache)
        .with_interval(Duration::from_secs(config.reaper_interval_seconds))
        .with_retry_policy(
            config.reaper_max_retries,
            Duration::from_millis(config.reaper_backoff_ms),
        )
        .with_cycle_timeout(Duration::from_secs(config.reaper_cycle_timeout_seconds));

    tokio::select! {
        _ = reaper.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping reaper");
        }
    }
}
