//! Link lifecycle service: create, delete, rotate, stats, reverse search.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::Url;

use crate::domain::entities::{Link, NewLink, StatsView};
use crate::domain::repositories::LinkRepository;
use crate::error::LinkError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{DEFAULT_CODE_LENGTH, generate_code, validate_alias};

/// Default bound on insertion retries when a generated code collides.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 10;

/// Orchestrates the link lifecycle around the repository and cache.
///
/// Uniqueness of generated codes is enforced by retry-on-conflict against
/// the store, never by in-process locking: concurrent creates racing on the
/// same code both attempt insertion and the loser retries with a new code.
pub struct LinkService<R: LinkRepository, C: CacheService> {
    repository: Arc<R>,
    cache: Arc<C>,
    code_length: usize,
    max_code_attempts: u32,
}

impl<R: LinkRepository, C: CacheService> LinkService<R, C> {
    /// Creates a new link service with default code length and retry bound.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            repository,
            cache,
            code_length: DEFAULT_CODE_LENGTH,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    /// Overrides the length of generated short codes.
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }

    /// Overrides the bound on insertion retries for generated codes.
    pub fn with_max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts.max(1);
        self
    }

    /// Creates a short link.
    ///
    /// With a custom alias, the alias becomes the short code and must not
    /// collide with any existing code or alias (cross-field collisions are
    /// conflicts). Without one, codes are generated and insertion retried
    /// on conflict up to the configured bound.
    ///
    /// # Errors
    ///
    /// - [`LinkError::InvalidUrl`] - destination is not an absolute http(s) URL
    /// - [`LinkError::InvalidAlias`] - alias is not alphanumeric
    /// - [`LinkError::InvalidExpiration`] - `expires_at` is not strictly future
    /// - [`LinkError::AliasConflict`] - alias already resolves to a link
    /// - [`LinkError::AllocationExhausted`] - no free code within the bound
    pub async fn create(
        &self,
        owner_id: i64,
        long_url: String,
        custom_alias: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, LinkError> {
        validate_url(&long_url)?;

        if let Some(deadline) = expires_at {
            if deadline <= Utc::now() {
                return Err(LinkError::InvalidExpiration);
            }
        }

        if let Some(alias) = custom_alias {
            validate_alias(&alias)?;

            // Cross-field collision check: the alias must not equal any
            // existing short_code or custom_alias.
            if self.repository.find_by_code(&alias).await?.is_some() {
                return Err(LinkError::AliasConflict(alias));
            }

            return self
                .repository
                .insert(NewLink {
                    owner_id,
                    long_url,
                    short_code: alias.clone(),
                    custom_alias: Some(alias),
                    expires_at,
                })
                .await;
        }

        for attempt in 1..=self.max_code_attempts {
            let code = generate_code(self.code_length);

            match self
                .repository
                .insert(NewLink {
                    owner_id,
                    long_url: long_url.clone(),
                    short_code: code,
                    custom_alias: None,
                    expires_at,
                })
                .await
            {
                Ok(link) => return Ok(link),
                Err(LinkError::AliasConflict(code)) => {
                    warn!("generated code '{}' collided (attempt {})", code, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LinkError::AllocationExhausted(self.max_code_attempts))
    }

    /// Soft-deletes a link: clears both resolvable keys and evicts their
    /// cache entries. The row itself is kept.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotFound`], [`LinkError::Expired`] (checked before
    /// ownership), or [`LinkError::Forbidden`].
    pub async fn delete(&self, owner_id: i64, key: &str) -> Result<(), LinkError> {
        let link = self.checked_lookup(owner_id, key).await?;

        self.repository.update_short_code(link.id, None).await?;
        self.evict_keys(&link).await;

        debug!("soft-deleted link {} ('{}')", link.id, key);
        Ok(())
    }

    /// Replaces the short code of a link with a freshly generated one.
    ///
    /// The old code stops resolving and its cache entry is evicted; the
    /// custom alias, when present, keeps pointing at the same record.
    ///
    /// # Errors
    ///
    /// Same checks as [`Self::delete`], plus
    /// [`LinkError::AllocationExhausted`] when no free code is found.
    pub async fn rotate(&self, owner_id: i64, key: &str) -> Result<Link, LinkError> {
        let link = self.checked_lookup(owner_id, key).await?;

        for attempt in 1..=self.max_code_attempts {
            let code = generate_code(self.code_length);

            match self.repository.update_short_code(link.id, Some(&code)).await {
                Ok(updated) => {
                    // The new code is a different cache key; only the old
                    // one must stop resolving.
                    if let Some(old_code) = &link.short_code {
                        let _ = self.cache.invalidate(old_code).await;
                    }
                    return Ok(updated);
                }
                Err(LinkError::AliasConflict(code)) => {
                    warn!("rotated code '{}' collided (attempt {})", code, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LinkError::AllocationExhausted(self.max_code_attempts))
    }

    /// Read-only statistics projection for an owned link.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotFound`] or [`LinkError::Forbidden`].
    pub async fn stats(&self, owner_id: i64, key: &str) -> Result<StatsView, LinkError> {
        let link = self
            .repository
            .find_by_code(key)
            .await?
            .ok_or_else(|| LinkError::NotFound(key.to_string()))?;

        if link.owner_id != owner_id {
            return Err(LinkError::Forbidden(key.to_string()));
        }

        Ok(StatsView::from(&link))
    }

    /// Reverse lookup: returns the short code serving a destination.
    /// Low-frequency path, no cache interaction.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotFound`] when no live link serves the URL.
    pub async fn find_by_long_url(&self, long_url: &str) -> Result<String, LinkError> {
        self.repository
            .find_by_long_url(long_url)
            .await?
            .and_then(|link| link.short_code)
            .ok_or_else(|| LinkError::NotFound(long_url.to_string()))
    }

    /// Shared lookup for mutating operations: NotFound, then expiration,
    /// then ownership.
    async fn checked_lookup(&self, owner_id: i64, key: &str) -> Result<Link, LinkError> {
        let link = self
            .repository
            .find_by_code(key)
            .await?
            .ok_or_else(|| LinkError::NotFound(key.to_string()))?;

        if link.is_expired() {
            return Err(LinkError::Expired(key.to_string()));
        }

        if link.owner_id != owner_id {
            return Err(LinkError::Forbidden(key.to_string()));
        }

        Ok(link)
    }

    async fn evict_keys(&self, link: &Link) {
        if let Some(code) = &link.short_code {
            let _ = self.cache.invalidate(code).await;
        }
        if let Some(alias) = &link.custom_alias {
            if link.short_code.as_deref() != Some(alias.as_str()) {
                let _ = self.cache.invalidate(alias).await;
            }
        }
    }
}

fn validate_url(long_url: &str) -> Result<(), LinkError> {
    let parsed =
        Url::parse(long_url).map_err(|_| LinkError::InvalidUrl(long_url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(LinkError::InvalidUrl(long_url.to_string()));
    }

    Ok(())
}
