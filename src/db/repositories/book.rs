//! Book repository
//!
//! Database operations for books, including the filtered and ordered list
//! query behind the catalogue endpoint. Filters are appended to a
//! `QueryBuilder` so every value is bound, never interpolated.

use crate::db::DbPool;
use crate::models::{Book, BookFilter};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Escape character used in `LIKE ... ESCAPE` clauses
const LIKE_ESCAPE: char = '!';

/// Book repository trait
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create a new book
    async fn create(&self, book: &Book) -> Result<Book>;

    /// Get book by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// List books matching a filter
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// List books written by an author, ordered by title
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Book>>;

    /// List books held by a library, ordered by title
    async fn list_by_library(&self, library_id: i64) -> Result<Vec<Book>>;

    /// Update a book
    async fn update(&self, book: &Book) -> Result<Book>;

    /// Delete a book, returning false if it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based book repository implementation
pub struct SqlxBookRepository {
    pool: DbPool,
}

impl SqlxBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn BookRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BookRepository for SqlxBookRepository {
    async fn create(&self, book: &Book) -> Result<Book> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (title, publication_year, author_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(book.author_id)
        .execute(&self.pool)
        .await
        .context("Failed to create book")?;

        Ok(Book {
            id: result.last_insert_rowid(),
            ..book.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, publication_year, author_id
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get book by ID")?;

        Ok(row.as_ref().map(row_to_book))
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut query = build_list_query(filter);
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list books")?;

        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, publication_year, author_id
            FROM books
            WHERE author_id = ?
            ORDER BY title, id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list books by author")?;

        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn list_by_library(&self, library_id: i64) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.title, b.publication_year, b.author_id
            FROM books b
            INNER JOIN library_books lb ON lb.book_id = b.id
            WHERE lb.library_id = ?
            ORDER BY b.title, b.id
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list books by library")?;

        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        sqlx::query(
            r#"
            UPDATE books
            SET title = ?, publication_year = ?, author_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(book.publication_year)
        .bind(book.author_id)
        .bind(book.id)
        .execute(&self.pool)
        .await
        .context("Failed to update book")?;

        self.get_by_id(book.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Book not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete book")?;

        Ok(result.rows_affected() > 0)
    }
}

fn build_list_query(filter: &BookFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query: QueryBuilder<'static, Sqlite> = QueryBuilder::new(
        r#"
        SELECT b.id, b.title, b.publication_year, b.author_id
        FROM books b
        INNER JOIN authors a ON a.id = b.author_id
        WHERE 1 = 1
        "#,
    );

    if let Some(title) = &filter.title {
        query.push(" AND b.title = ").push_bind(title.clone());
    }
    if let Some(year) = filter.publication_year {
        query.push(" AND b.publication_year = ").push_bind(year);
    }
    if let Some(author_id) = filter.author_id {
        query.push(" AND b.author_id = ").push_bind(author_id);
    }
    if let Some(term) = filter.search_term() {
        // SQLite LIKE folds ASCII case only; the term is bound unfolded so
        // non-ASCII text still matches itself exactly.
        let pattern = format!("%{}%", escape_like(term));
        query
            .push(" AND (b.title LIKE ")
            .push_bind(pattern.clone())
            .push(format!(" ESCAPE '{}'", LIKE_ESCAPE))
            .push(" OR a.name LIKE ")
            .push_bind(pattern)
            .push(format!(" ESCAPE '{}')", LIKE_ESCAPE));
    }

    query.push(" ORDER BY ").push(filter.ordering.as_sql());
    query
}

/// Escape LIKE wildcards so the term matches literally
pub(crate) fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

fn row_to_book(row: &sqlx::sqlite::SqliteRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        publication_year: row.get("publication_year"),
        author_id: row.get("author_id"),
    }
}
