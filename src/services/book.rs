//! Book service
//!
//! Catalogue rules for books:
//! - a book must have a non-empty title and an existing author
//! - on create, the publication year may not be in the future
//! - updates are partial and do not re-check the year
//!
//! Listing delegates filtering, search and ordering to the repository.

use crate::db::repositories::{AuthorRepository, BookRepository};
use crate::models::{Book, BookFilter, CreateBookInput, UpdateBookInput};
use anyhow::Context;
use chrono::{Datelike, Utc};
use std::sync::Arc;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Error types for book service operations
#[derive(Debug, thiserror::Error)]
pub enum BookServiceError {
    #[error("Book not found: {0}")]
    NotFound(i64),

    /// Invalid input for one field
    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl BookServiceError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }
}

/// Reject publication years later than `current_year`.
///
/// Past years, including negative ones, are accepted.
pub fn validate_publication_year(year: i32, current_year: i32) -> Result<(), BookServiceError> {
    if year > current_year {
        return Err(BookServiceError::invalid(
            "publication_year",
            format!(
                "Publication year cannot be in the future (current year is {})",
                current_year
            ),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<String, BookServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BookServiceError::invalid("title", "Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(BookServiceError::invalid(
            "title",
            format!("Title cannot exceed {} characters", MAX_TITLE_LENGTH),
        ));
    }
    Ok(title.to_string())
}

/// Book service
pub struct BookService {
    book_repo: Arc<dyn BookRepository>,
    author_repo: Arc<dyn AuthorRepository>,
}

impl BookService {
    pub fn new(book_repo: Arc<dyn BookRepository>, author_repo: Arc<dyn AuthorRepository>) -> Self {
        Self {
            book_repo,
            author_repo,
        }
    }

    /// List books matching a filter
    pub async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, BookServiceError> {
        let books = self.book_repo.list(filter).await.context("Failed to list books")?;
        Ok(books)
    }

    /// Get a book by ID
    pub async fn get(&self, id: i64) -> Result<Book, BookServiceError> {
        self.book_repo
            .get_by_id(id)
            .await
            .context("Failed to get book")?
            .ok_or(BookServiceError::NotFound(id))
    }

    /// Create a book, checking the year against today's date
    pub async fn create(&self, input: CreateBookInput) -> Result<Book, BookServiceError> {
        self.create_with_current_year(input, Utc::now().year()).await
    }

    /// Create a book, checking the year against `current_year`
    pub async fn create_with_current_year(
        &self,
        input: CreateBookInput,
        current_year: i32,
    ) -> Result<Book, BookServiceError> {
        let title = validate_title(&input.title)?;
        validate_publication_year(input.publication_year, current_year)?;
        self.ensure_author_exists(input.author_id).await?;

        let book = self
            .book_repo
            .create(&Book {
                id: 0,
                title,
                publication_year: input.publication_year,
                author_id: input.author_id,
            })
            .await
            .context("Failed to create book")?;

        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    /// Apply a partial update
    pub async fn update(&self, id: i64, input: UpdateBookInput) -> Result<Book, BookServiceError> {
        let mut book = self.get(id).await?;

        if let Some(title) = input.title {
            book.title = validate_title(&title)?;
        }
        if let Some(year) = input.publication_year {
            book.publication_year = year;
        }
        if let Some(author_id) = input.author_id {
            self.ensure_author_exists(author_id).await?;
            book.author_id = author_id;
        }

        let updated = self.book_repo.update(&book).await.context("Failed to update book")?;
        Ok(updated)
    }

    /// Delete a book
    pub async fn delete(&self, id: i64) -> Result<(), BookServiceError> {
        let deleted = self.book_repo.delete(id).await.context("Failed to delete book")?;
        if !deleted {
            return Err(BookServiceError::NotFound(id));
        }
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    async fn ensure_author_exists(&self, author_id: i64) -> Result<(), BookServiceError> {
        let exists = self
            .author_repo
            .exists(author_id)
            .await
            .context("Failed to check author")?;
        if !exists {
            return Err(BookServiceError::invalid(
                "author",
                format!("Author {} does not exist", author_id),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAuthorRepository, SqlxBookRepository};
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_test_service() -> (BookService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let author = author_repo.create("George Orwell").await.unwrap();
        let service = BookService::new(SqlxBookRepository::boxed(pool), author_repo);
        (service, author.id)
    }

    fn input(title: &str, year: i32, author_id: i64) -> CreateBookInput {
        CreateBookInput {
            title: title.to_string(),
            publication_year: year,
            author_id,
        }
    }

    #[tokio::test]
    async fn test_create_book() {
        let (service, author) = setup_test_service().await;

        let book = service.create(input(" 1984 ", 1949, author)).await.unwrap();
        assert!(book.id > 0);
        assert_eq!(book.title, "1984");
        assert_eq!(service.get(book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_create_rejects_future_year() {
        let (service, author) = setup_test_service().await;

        let result = service
            .create_with_current_year(input("Tomorrow", 2031, author), 2030)
            .await;
        assert!(matches!(
            result,
            Err(BookServiceError::ValidationError { field: "publication_year", .. })
        ));

        let ok = service
            .create_with_current_year(input("Today", 2030, author), 2030)
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_author_and_empty_title() {
        let (service, author) = setup_test_service().await;

        let result = service.create(input("Orphan", 2000, author + 100)).await;
        assert!(matches!(
            result,
            Err(BookServiceError::ValidationError { field: "author", .. })
        ));

        let result = service.create(input("   ", 2000, author)).await;
        assert!(matches!(
            result,
            Err(BookServiceError::ValidationError { field: "title", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_does_not_recheck_year() {
        let (service, author) = setup_test_service().await;
        let book = service.create(input("1984", 1949, author)).await.unwrap();

        let updated = service
            .update(
                book.id,
                UpdateBookInput {
                    publication_year: Some(9999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.publication_year, 9999);
        assert_eq!(updated.title, "1984");
    }

    #[tokio::test]
    async fn test_delete_book() {
        let (service, author) = setup_test_service().await;
        let book = service.create(input("1984", 1949, author)).await.unwrap();

        service.delete(book.id).await.unwrap();
        assert!(matches!(service.get(book.id).await, Err(BookServiceError::NotFound(_))));
        assert!(matches!(
            service.delete(book.id).await,
            Err(BookServiceError::NotFound(_))
        ));
    }

    proptest! {
        #[test]
        fn publication_year_accepts_exactly_non_future_years(
            year in -5000i32..5000,
            current in 1i32..4000,
        ) {
            let result = validate_publication_year(year, current);
            prop_assert_eq!(result.is_ok(), year <= current);
        }
    }
}
