//! Link entity representing a short code to destination mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A shortened URL link with metadata.
///
/// `short_code` is `None` once the link has been soft-deleted or reaped;
/// deletion is modeled as clearing the resolvable keys, not removing the row.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub id: i64,
    pub owner_id: i64,
    pub long_url: String,
    pub short_code: Option<String>,
    pub custom_alias: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
}

impl Link {
    /// Returns true if the link has passed its expiry time.
    ///
    /// The boundary is strict: a link whose `expires_at` equals "now"
    /// is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has passed its expiry time as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the link still carries a resolvable key and has
    /// not expired.
    pub fn is_live(&self) -> bool {
        self.short_code.is_some() && !self.is_expired()
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub owner_id: i64,
    pub long_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Read-only statistics projection returned by the stats operation.
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub views: i64,
}

impl From<&Link> for StatsView {
    fn from(link: &Link) -> Self {
        Self {
            long_url: link.long_url.clone(),
            created_at: link.created_at,
            views: link.views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_link(expires_at: Option<DateTime<Utc>>) -> Link {
        Link {
            id: 1,
            owner_id: 7,
            long_url: "https://example.com".to_string(),
            short_code: Some("abc123XYZ042".to_string()),
            custom_alias: None,
            created_at: Utc::now(),
            expires_at,
            views: 0,
        }
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        let link = test_link(None);
        assert!(!link.is_expired());
        assert!(link.is_live());
    }

    #[test]
    fn test_link_past_expiry_is_expired() {
        let link = test_link(Some(Utc::now() - Duration::seconds(1)));
        assert!(link.is_expired());
        assert!(!link.is_live());
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        // expires_at exactly equal to "now" counts as expired.
        let now = Utc::now();
        let link = test_link(Some(now));
        assert!(link.is_expired_at(now));
        // One second before the deadline the link is still live.
        assert!(!link.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_cleared_code_is_not_live() {
        let mut link = test_link(None);
        link.short_code = None;
        assert!(!link.is_live());
    }

    #[test]
    fn test_stats_view_projection() {
        let mut link = test_link(None);
        link.views = 42;
        let stats = StatsView::from(&link);
        assert_eq!(stats.long_url, "https://example.com");
        assert_eq!(stats.views, 42);
        assert_eq!(stats.created_at, link.created_at);
    }
}
