//! Repository trait for durable link storage.

use crate::domain::entities::{Link, NewLink};
use crate::error::LinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable, authoritative mapping from short code to link record.
///
/// Uniqueness of `short_code` and `custom_alias` is enforced here, by the
/// store's unique constraints, not by application-level locking: concurrent
/// creates racing on the same code both attempt insertion and the loser
/// retries with a fresh code.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - tests
///   and single-node deployments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::AliasConflict`] when the code or alias collides
    /// with an existing record (the retry signal for generated codes), and
    /// [`LinkError::StoreUnavailable`] / [`LinkError::Store`] on store
    /// failures.
    async fn insert(&self, new_link: NewLink) -> Result<Link, LinkError>;

    /// Finds a link whose `short_code` or `custom_alias` equals `key`.
    ///
    /// Soft-deleted links (cleared `short_code`) do not match on the code
    /// field; an alias only matches while the record still carries it.
    async fn find_by_code(&self, key: &str) -> Result<Option<Link>, LinkError>;

    /// Reverse lookup by destination address.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, LinkError>;

    /// Replaces `short_code` with `code`, or clears it when `code` is `None`.
    ///
    /// Clearing the code also clears `custom_alias` so that neither key
    /// resolves afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] when no row matches `id`, and
    /// [`LinkError::AliasConflict`] when the new code collides.
    async fn update_short_code<'a>(&self, id: i64, code: Option<&'a str>) -> Result<Link, LinkError>;

    /// Atomically increments the view counter of the given link.
    async fn increment_views(&self, id: i64) -> Result<(), LinkError>;

    /// Atomically increments the view counter of the link matching `key`
    /// by code or alias. Returns `false` when no live record matched.
    ///
    /// Used on the cache-hit path, where no record has been loaded.
    async fn increment_views_by_code(&self, key: &str) -> Result<bool, LinkError>;

    /// Lists links whose `expires_at` has passed and that still carry a
    /// short code.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, LinkError>;

    /// Conditionally clears `short_code` and `custom_alias` of an expired
    /// link. The update only applies while the row still carries a code and
    /// is expired as of `now`, which makes re-sweeping an already-cleared
    /// link a no-op and resolves reaper/rotate races.
    ///
    /// Returns `true` when a row was cleared.
    async fn clear_expired_code(&self, id: i64, now: DateTime<Utc>) -> Result<bool, LinkError>;
}
