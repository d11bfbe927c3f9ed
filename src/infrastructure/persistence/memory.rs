//! In-memory implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::LinkError;

/// In-memory link repository backed by DashMap.
///
/// Used by the integration test suites and for single-node deployments
/// without Postgres. A secondary key index makes code/alias claims atomic,
/// giving the same uniqueness semantics as the Postgres unique constraints:
/// concurrent inserts racing on one code see exactly one winner.
pub struct InMemoryLinkRepository {
    links: DashMap<i64, Link>,
    /// code-or-alias -> link id. Entry-level locking arbitrates races.
    keys: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl InMemoryLinkRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            keys: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Claims `key` for `id`, failing when another link already holds it.
    fn claim_key(&self, key: &str, id: i64) -> Result<(), LinkError> {
        match self.keys.entry(key.to_string()) {
            Entry::Occupied(o) if *o.get() == id => Ok(()),
            Entry::Occupied(_) => Err(LinkError::AliasConflict(key.to_string())),
            Entry::Vacant(v) => {
                v.insert(id);
                Ok(())
            }
        }
    }

    fn release_key(&self, key: &str) {
        self.keys.remove(key);
    }
}

impl Default for InMemoryLinkRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, LinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.claim_key(&new_link.short_code, id)?;
        if let Some(alias) = &new_link.custom_alias {
            if alias != &new_link.short_code {
                if let Err(e) = self.claim_key(alias, id) {
                    self.release_key(&new_link.short_code);
                    return Err(e);
                }
            }
        }

        let link = Link {
            id,
            owner_id: new_link.owner_id,
            long_url: new_link.long_url,
            short_code: Some(new_link.short_code),
            custom_alias: new_link.custom_alias,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            views: 0,
        };

        self.links.insert(id, link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, key: &str) -> Result<Option<Link>, LinkError> {
        let Some(id) = self.keys.get(key).map(|e| *e) else {
            return Ok(None);
        };

        Ok(self.links.get(&id).map(|l| l.clone()))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, LinkError> {
        Ok(self
            .links
            .iter()
            .filter(|l| l.long_url == long_url && l.short_code.is_some())
            .min_by_key(|l| l.id)
            .map(|l| l.clone()))
    }

    async fn update_short_code<'a>(&self, id: i64, code: Option<&'a str>) -> Result<Link, LinkError> {
        match code {
            Some(new_code) => {
                self.claim_key(new_code, id)?;

                let Some(mut link) = self.links.get_mut(&id) else {
                    self.release_key(new_code);
                    return Err(LinkError::NotFound(id.to_string()));
                };

                if let Some(old_code) = link.short_code.take() {
                    if old_code != new_code {
                        self.release_key(&old_code);
                    }
                }
                link.short_code = Some(new_code.to_string());
                Ok(link.clone())
            }
            None => {
                let Some(mut link) = self.links.get_mut(&id) else {
                    return Err(LinkError::NotFound(id.to_string()));
                };

                if let Some(old_code) = link.short_code.take() {
                    self.release_key(&old_code);
                }
                if let Some(alias) = link.custom_alias.take() {
                    self.release_key(&alias);
                }
                Ok(link.clone())
            }
        }
    }

    async fn increment_views(&self, id: i64) -> Result<(), LinkError> {
        if let Some(mut link) = self.links.get_mut(&id) {
            link.views += 1;
        }
        Ok(())
    }

    async fn increment_views_by_code(&self, key: &str) -> Result<bool, LinkError> {
        let Some(id) = self.keys.get(key).map(|e| *e) else {
            return Ok(false);
        };

        if let Some(mut link) = self.links.get_mut(&id) {
            link.views += 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, LinkError> {
        Ok(self
            .links
            .iter()
            .filter(|l| l.short_code.is_some() && l.is_expired_at(now))
            .map(|l| l.clone())
            .collect())
    }

    async fn clear_expired_code(&self, id: i64, now: DateTime<Utc>) -> Result<bool, LinkError> {
        let Some(mut link) = self.links.get_mut(&id) else {
            return Ok(false);
        };

        if link.short_code.is_none() || !link.is_expired_at(now) {
            return Ok(false);
        }

        if let Some(old_code) = link.short_code.take() {
            self.release_key(&old_code);
        }
        if let Some(alias) = link.custom_alias.take() {
            self.release_key(&alias);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_link(code: &str, alias: Option<&str>) -> NewLink {
        NewLink {
            owner_id: 1,
            long_url: "https://example.com".to_string(),
            short_code: code.to_string(),
            custom_alias: alias.map(String::from),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_both_keys() {
        let repo = InMemoryLinkRepository::new();
        let link = repo.insert(new_link("code1", Some("alias1"))).await.unwrap();

        let by_code = repo.find_by_code("code1").await.unwrap().unwrap();
        let by_alias = repo.find_by_code("alias1").await.unwrap().unwrap();
        assert_eq!(by_code.id, link.id);
        assert_eq!(by_alias.id, link.id);
    }

    #[tokio::test]
    async fn test_insert_conflict_on_code_and_cross_field() {
        let repo = InMemoryLinkRepository::new();
        repo.insert(new_link("code1", Some("alias1"))).await.unwrap();

        let dup_code = repo.insert(new_link("code1", None)).await;
        assert!(matches!(dup_code, Err(LinkError::AliasConflict(_))));

        // An alias colliding with another record's code is also a conflict.
        let cross = repo.insert(new_link("code2", Some("code1"))).await;
        assert!(matches!(cross, Err(LinkError::AliasConflict(_))));

        // A failed insert must not leak key claims.
        assert!(repo.find_by_code("code2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_short_code_releases_old_key() {
        let repo = InMemoryLinkRepository::new();
        let link = repo.insert(new_link("old0code", None)).await.unwrap();

        let updated = repo
            .update_short_code(link.id, Some("new0code"))
            .await
            .unwrap();
        assert_eq!(updated.short_code.as_deref(), Some("new0code"));

        assert!(repo.find_by_code("old0code").await.unwrap().is_none());
        assert!(repo.find_by_code("new0code").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_expired_code_is_conditional() {
        let repo = InMemoryLinkRepository::new();
        let now = Utc::now();

        let mut fresh = new_link("live1", None);
        fresh.expires_at = Some(now + Duration::hours(1));
        let live = repo.insert(fresh).await.unwrap();

        // Not yet expired: the conditional update must not apply.
        assert!(!repo.clear_expired_code(live.id, now).await.unwrap());

        let mut stale = new_link("dead1", Some("deadalias"));
        stale.expires_at = Some(now - Duration::hours(1));
        let dead = repo.insert(stale).await.unwrap();

        assert!(repo.clear_expired_code(dead.id, now).await.unwrap());
        // Second sweep over the same link is a no-op.
        assert!(!repo.clear_expired_code(dead.id, now).await.unwrap());
        assert!(repo.find_by_code("dead1").await.unwrap().is_none());
        assert!(repo.find_by_code("deadalias").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_expired_skips_cleared_links() {
        let repo = InMemoryLinkRepository::new();
        let now = Utc::now();

        let mut stale = new_link("dead2", None);
        stale.expires_at = Some(now - Duration::minutes(5));
        let dead = repo.insert(stale).await.unwrap();

        assert_eq!(repo.list_expired(now).await.unwrap().len(), 1);

        repo.clear_expired_code(dead.id, now).await.unwrap();
        assert!(repo.list_expired(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment_views_by_code() {
        let repo = InMemoryLinkRepository::new();
        let link = repo.insert(new_link("code3", None)).await.unwrap();

        assert!(repo.increment_views_by_code("code3").await.unwrap());
        assert!(repo.increment_views_by_code("code3").await.unwrap());
        assert!(!repo.increment_views_by_code("absent").await.unwrap());

        let found = repo.find_by_code("code3").await.unwrap().unwrap();
        assert_eq!(found.views, 2);
        assert_eq!(found.id, link.id);
    }
}
