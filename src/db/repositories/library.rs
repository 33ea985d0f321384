//! Library repository
//!
//! Libraries, their book holdings and their single librarian.

use crate::db::DbPool;
use crate::models::{Librarian, Library};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Library repository trait
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Create a new library
    async fn create(&self, name: &str) -> Result<Library>;

    /// Get library by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Library>>;

    /// List all libraries ordered by name
    async fn list(&self) -> Result<Vec<Library>>;

    /// Add a book to a library; adding the same book twice is a no-op
    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<()>;

    /// Get the librarian assigned to a library
    async fn get_librarian(&self, library_id: i64) -> Result<Option<Librarian>>;

    /// Assign a librarian, replacing the current one if any
    async fn set_librarian(&self, library_id: i64, name: &str) -> Result<Librarian>;
}

/// SQLx-based library repository implementation
pub struct SqlxLibraryRepository {
    pool: DbPool,
}

impl SqlxLibraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn LibraryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LibraryRepository for SqlxLibraryRepository {
    async fn create(&self, name: &str) -> Result<Library> {
        let result = sqlx::query("INSERT INTO libraries (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .context("Failed to create library")?;

        Ok(Library {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Library>> {
        let row = sqlx::query("SELECT id, name FROM libraries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get library by ID")?;

        Ok(row.as_ref().map(row_to_library))
    }

    async fn list(&self) -> Result<Vec<Library>> {
        let rows = sqlx::query("SELECT id, name FROM libraries ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list libraries")?;

        Ok(rows.iter().map(row_to_library).collect())
    }

    async fn add_book(&self, library_id: i64, book_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?, ?)")
            .bind(library_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .context("Failed to add book to library")?;

        Ok(())
    }

    async fn get_librarian(&self, library_id: i64) -> Result<Option<Librarian>> {
        let row = sqlx::query("SELECT id, name, library_id FROM librarians WHERE library_id = ?")
            .bind(library_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get librarian")?;

        Ok(row.as_ref().map(row_to_librarian))
    }

    async fn set_librarian(&self, library_id: i64, name: &str) -> Result<Librarian> {
        sqlx::query(
            r#"
            INSERT INTO librarians (name, library_id)
            VALUES (?, ?)
            ON CONFLICT(library_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(name)
        .bind(library_id)
        .execute(&self.pool)
        .await
        .context("Failed to set librarian")?;

        self.get_librarian(library_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Librarian not found after update"))
    }
}

fn row_to_library(row: &sqlx::sqlite::SqliteRow) -> Library {
    Library {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn row_to_librarian(row: &sqlx::sqlite::SqliteRow) -> Librarian {
    Librarian {
        id: row.get("id"),
        name: row.get("name"),
        library_id: row.get("library_id"),
    }
}
