//! Author service

use crate::db::repositories::{AuthorRepository, BookRepository};
use crate::models::{AuthorWithBooks, CreateAuthorInput};
use anyhow::Context;
use std::sync::Arc;

/// Maximum author name length in characters
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum AuthorServiceError {
    #[error("Author not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Author service; every author is returned with its books
pub struct AuthorService {
    author_repo: Arc<dyn AuthorRepository>,
    book_repo: Arc<dyn BookRepository>,
}

impl AuthorService {
    pub fn new(author_repo: Arc<dyn AuthorRepository>, book_repo: Arc<dyn BookRepository>) -> Self {
        Self {
            author_repo,
            book_repo,
        }
    }

    pub async fn list(&self) -> Result<Vec<AuthorWithBooks>, AuthorServiceError> {
        let authors = self.author_repo.list().await.context("Failed to list authors")?;

        let mut result = Vec::with_capacity(authors.len());
        for author in authors {
            let books = self
                .book_repo
                .list_by_author(author.id)
                .await
                .context("Failed to list author books")?;
            result.push(AuthorWithBooks { author, books });
        }
        Ok(result)
    }

    pub async fn get(&self, id: i64) -> Result<AuthorWithBooks, AuthorServiceError> {
        let author = self
            .author_repo
            .get_by_id(id)
            .await
            .context("Failed to get author")?
            .ok_or(AuthorServiceError::NotFound(id))?;
        let books = self
            .book_repo
            .list_by_author(id)
            .await
            .context("Failed to list author books")?;

        Ok(AuthorWithBooks { author, books })
    }

    pub async fn create(&self, input: CreateAuthorInput) -> Result<AuthorWithBooks, AuthorServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthorServiceError::ValidationError {
                field: "name",
                message: "Name cannot be empty".to_string(),
            });
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AuthorServiceError::ValidationError {
                field: "name",
                message: format!("Name cannot exceed {} characters", MAX_NAME_LENGTH),
            });
        }

        let author = self
            .author_repo
            .create(name)
            .await
            .context("Failed to create author")?;
        tracing::info!("Created author {} ({})", author.id, author.name);

        Ok(AuthorWithBooks {
            author,
            books: Vec::new(),
        })
    }
}
