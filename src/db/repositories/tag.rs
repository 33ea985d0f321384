//! Tag repository
//!
//! Database operations for tags.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite
//! - [`get_or_create_tag`], the get-or-create step used inside post
//!   transactions

use crate::db::DbPool;
use crate::models::{Tag, TagWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use std::sync::Arc;

/// Slug used when a tag name has no sluggable characters
const FALLBACK_SLUG: &str = "tag";

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// All tags ordered by name, each with the number of posts carrying it
    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>>;

    /// Tags attached to a post, ordered by name
    async fn get_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DbPool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            SELECT id, slug, name, created_at
            FROM tags
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by slug")?;

        Ok(row.as_ref().map(row_to_tag))
    }

    async fn list_with_counts(&self) -> Result<Vec<TagWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.slug, t.name, t.created_at, COUNT(pt.post_id) as post_count
            FROM tags t
            LEFT JOIN post_tags pt ON t.id = pt.tag_id
            GROUP BY t.id, t.slug, t.name, t.created_at
            ORDER BY t.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags with counts")?;

        Ok(rows
            .iter()
            .map(|row| TagWithCount::new(row_to_tag(row), row.get("post_count")))
            .collect())
    }

    async fn get_by_post_id(&self, post_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.slug, t.name, t.created_at
            FROM tags t
            INNER JOIN post_tags pt ON t.id = pt.tag_id
            WHERE pt.post_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get tags for post")?;

        Ok(rows.iter().map(row_to_tag).collect())
    }
}

/// Return the tag named `tag.name`, creating it if needed.
///
/// Runs on a caller-provided connection so it can take part in a post
/// transaction. When `tag.slug` is already used by a differently named tag,
/// a numeric suffix is appended (`rust-2`, `rust-3`, ...).
pub async fn get_or_create_tag(conn: &mut SqliteConnection, tag: &Tag) -> Result<Tag> {
    let existing = sqlx::query("SELECT id, slug, name, created_at FROM tags WHERE name = ?")
        .bind(&tag.name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get tag by name")?;
    if let Some(row) = existing {
        return Ok(row_to_tag(&row));
    }

    let base = if tag.slug.is_empty() {
        FALLBACK_SLUG
    } else {
        tag.slug.as_str()
    };
    let mut slug = base.to_string();
    let mut suffix = 1;
    while slug_taken(conn, &slug).await? {
        suffix += 1;
        slug = format!("{}-{}", base, suffix);
    }

    let now = Utc::now();
    let result = sqlx::query("INSERT INTO tags (slug, name, created_at) VALUES (?, ?, ?)")
        .bind(&slug)
        .bind(&tag.name)
        .bind(now)
        .execute(&mut *conn)
        .await
        .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        slug,
        name: tag.name.clone(),
        created_at: now,
    })
}

async fn slug_taken(conn: &mut SqliteConnection, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to check tag slug")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}
