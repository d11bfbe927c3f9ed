//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::LinkError;
use crate::utils::db_error::{is_unique_violation, map_sqlx_error};

/// PostgreSQL repository for link storage and retrieval.
///
/// Queries are bound at runtime, so no database is needed at compile time.
/// Code and alias uniqueness rides on the table's unique constraints; a
/// violation surfaces as [`LinkError::AliasConflict`], the signal the code
/// allocation retry loop keys off.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    owner_id: i64,
    long_url: String,
    short_code: Option<String>,
    custom_alias: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    views: i64,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            long_url: row.long_url,
            short_code: row.short_code,
            custom_alias: row.custom_alias,
            created_at: row.created_at,
            expires_at: row.expires_at,
            views: row.views,
        }
    }
}

const LINK_COLUMNS: &str =
    "id, owner_id, long_url, short_code, custom_alias, created_at, expires_at, views";

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, LinkError> {
        let sql = format!(
            r#"
            INSERT INTO links (owner_id, long_url, short_code, custom_alias, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(new_link.owner_id)
            .bind(&new_link.long_url)
            .bind(&new_link.short_code)
            .bind(&new_link.custom_alias)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(e) if is_unique_violation(&e) => {
                Err(LinkError::AliasConflict(new_link.short_code))
            }
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn find_by_code(&self, key: &str) -> Result<Option<Link>, LinkError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE short_code = $1 OR custom_alias = $1
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(key)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, LinkError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE long_url = $1 AND short_code IS NOT NULL
            ORDER BY created_at
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(long_url)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn update_short_code<'a>(&self, id: i64, code: Option<&'a str>) -> Result<Link, LinkError> {
        // Clearing the code also clears the alias so neither key resolves.
        let sql = format!(
            r#"
            UPDATE links
            SET short_code = $2,
                custom_alias = CASE WHEN $2 IS NULL THEN NULL ELSE custom_alias END
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await;

        match result {
            Ok(Some(row)) => Ok(row.into()),
            Ok(None) => Err(LinkError::NotFound(id.to_string())),
            Err(e) if is_unique_violation(&e) => Err(LinkError::AliasConflict(
                code.unwrap_or_default().to_string(),
            )),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn increment_views(&self, id: i64) -> Result<(), LinkError> {
        sqlx::query("UPDATE links SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn increment_views_by_code(&self, key: &str) -> Result<bool, LinkError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET views = views + 1
            WHERE short_code = $1 OR custom_alias = $1
            "#,
        )
        .bind(key)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, LinkError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE expires_at <= $1 AND short_code IS NOT NULL
            ORDER BY expires_at
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(now)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn clear_expired_code(&self, id: i64, now: DateTime<Utc>) -> Result<bool, LinkError> {
        // Conditional on the row still carrying a code and being expired,
        // so a concurrent rotate or a repeated sweep cannot double-process.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET short_code = NULL, custom_alias = NULL
            WHERE id = $1 AND short_code IS NOT NULL AND expires_at <= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
