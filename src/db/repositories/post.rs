//! Post repository
//!
//! Database operations for blog posts. Writes that touch both a post and its
//! tag links run inside a single transaction.

use super::tag::get_or_create_tag;
use crate::db::DbPool;
use crate::models::{Post, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post and link it to `tags` (get-or-created by name)
    async fn create(&self, post: &Post, tags: &[Tag]) -> Result<(Post, Vec<Tag>)>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Update title and content; `Some(tags)` replaces the tag set
    async fn update(&self, post: &Post, tags: Option<&[Tag]>) -> Result<Post>;

    /// Delete a post, returning false if it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All posts, newest first
    async fn list(&self) -> Result<Vec<Post>>;

    /// Posts carrying a tag, newest first
    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Post>>;

    /// Posts whose title, content or any tag name contains `term`,
    /// case-insensitively, newest first
    async fn search(&self, term: &str) -> Result<Vec<Post>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post, tags: &[Tag]) -> Result<(Post, Vec<Tag>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, author_id, published_date, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;

        let id = result.last_insert_rowid();
        let linked = link_tags(&mut tx, id, tags).await?;

        tx.commit().await.context("Failed to commit post")?;

        let created = Post {
            id,
            published_date: now,
            updated_at: now,
            ..post.clone()
        };
        Ok((created, linked))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published_date, updated_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by ID")?;

        Ok(row.as_ref().map(row_to_post))
    }

    async fn update(&self, post: &Post, tags: Option<&[Tag]>) -> Result<Post> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(&post.title)
            .bind(&post.content)
            .bind(Utc::now())
            .bind(post.id)
            .execute(&mut *tx)
            .await
            .context("Failed to update post")?;

        if let Some(tags) = tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
                .bind(post.id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear post tags")?;
            link_tags(&mut tx, post.id, tags).await?;
        }

        tx.commit().await.context("Failed to commit post")?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published_date, updated_at
            FROM posts
            ORDER BY published_date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts")?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, p.published_date, p.updated_at
            FROM posts p
            INNER JOIN post_tags pt ON pt.post_id = p.id
            WHERE pt.tag_id = ?
            ORDER BY p.published_date DESC, p.id DESC
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts by tag")?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn search(&self, term: &str) -> Result<Vec<Post>> {
        // Bound unfolded: SQLite LIKE is case-insensitive for ASCII only
        let pattern = format!("%{}%", super::book::escape_like(term));

        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.id, p.title, p.content, p.author_id, p.published_date, p.updated_at
            FROM posts p
            LEFT JOIN post_tags pt ON pt.post_id = p.id
            LEFT JOIN tags t ON t.id = pt.tag_id
            WHERE p.title LIKE ?1 ESCAPE '!'
               OR p.content LIKE ?1 ESCAPE '!'
               OR t.name LIKE ?1 ESCAPE '!'
            ORDER BY p.published_date DESC, p.id DESC
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search posts")?;

        Ok(rows.iter().map(row_to_post).collect())
    }
}

async fn link_tags(conn: &mut SqliteConnection, post_id: i64, tags: &[Tag]) -> Result<Vec<Tag>> {
    let mut linked = Vec::with_capacity(tags.len());
    for tag in tags {
        let stored = get_or_create_tag(conn, tag).await?;
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(stored.id)
            .execute(&mut *conn)
            .await
            .context("Failed to link tag to post")?;
        linked.push(stored);
    }
    Ok(linked)
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author_id: row.get("author_id"),
        published_date: row.get("published_date"),
        updated_at: row.get("updated_at"),
    }
}
