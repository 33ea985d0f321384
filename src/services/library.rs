//! Library service
//!
//! Libraries hold books from the shared catalogue and have at most one
//! librarian.

use crate::db::repositories::{BookRepository, LibraryRepository};
use crate::models::{Librarian, Library, LibraryDetail};
use anyhow::Context;
use std::sync::Arc;

/// Maximum library and librarian name length in characters
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum LibraryServiceError {
    #[error("Library not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_name(name: &str) -> Result<String, LibraryServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryServiceError::ValidationError {
            field: "name",
            message: "Name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(LibraryServiceError::ValidationError {
            field: "name",
            message: format!("Name cannot exceed {} characters", MAX_NAME_LENGTH),
        });
    }
    Ok(name.to_string())
}

pub struct LibraryService {
    library_repo: Arc<dyn LibraryRepository>,
    book_repo: Arc<dyn BookRepository>,
}

impl LibraryService {
    pub fn new(library_repo: Arc<dyn LibraryRepository>, book_repo: Arc<dyn BookRepository>) -> Self {
        Self {
            library_repo,
            book_repo,
        }
    }

    pub async fn list(&self) -> Result<Vec<Library>, LibraryServiceError> {
        let libraries = self.library_repo.list().await.context("Failed to list libraries")?;
        Ok(libraries)
    }

    /// Library with its books and librarian
    pub async fn get_detail(&self, id: i64) -> Result<LibraryDetail, LibraryServiceError> {
        let library = self.get_library(id).await?;
        let books = self
            .book_repo
            .list_by_library(id)
            .await
            .context("Failed to list library books")?;
        let librarian = self
            .library_repo
            .get_librarian(id)
            .await
            .context("Failed to get librarian")?;

        Ok(LibraryDetail {
            library,
            books,
            librarian,
        })
    }

    pub async fn create(&self, name: &str) -> Result<Library, LibraryServiceError> {
        let name = validate_name(name)?;
        let library = self
            .library_repo
            .create(&name)
            .await
            .context("Failed to create library")?;
        tracing::info!("Created library {} ({})", library.id, library.name);
        Ok(library)
    }

    /// Add a catalogue book to a library
    pub async fn add_book(&self, library_id: i64, book_id: i64) -> Result<LibraryDetail, LibraryServiceError> {
        self.get_library(library_id).await?;

        let book = self
            .book_repo
            .get_by_id(book_id)
            .await
            .context("Failed to get book")?;
        if book.is_none() {
            return Err(LibraryServiceError::ValidationError {
                field: "book_id",
                message: format!("Book {} does not exist", book_id),
            });
        }

        self.library_repo
            .add_book(library_id, book_id)
            .await
            .context("Failed to add book to library")?;

        self.get_detail(library_id).await
    }

    /// Assign (or replace) the library's librarian
    pub async fn assign_librarian(&self, library_id: i64, name: &str) -> Result<Librarian, LibraryServiceError> {
        self.get_library(library_id).await?;
        let name = validate_name(name)?;

        let librarian = self
            .library_repo
            .set_librarian(library_id, &name)
            .await
            .context("Failed to assign librarian")?;
        Ok(librarian)
    }

    async fn get_library(&self, id: i64) -> Result<Library, LibraryServiceError> {
        self.library_repo
            .get_by_id(id)
            .await
            .context("Failed to get library")?
            .ok_or(LibraryServiceError::NotFound(id))
    }
}
