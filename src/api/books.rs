//! Book API endpoints
//!
//! - GET /api/v1/books - List books (filter, search, ordering)
//! - GET /api/v1/books/{id} - Get a book
//! - POST /api/v1/books - Create a book (auth)
//! - PUT|PATCH /api/v1/books/{id} - Partially update a book (auth)
//! - DELETE /api/v1/books/{id} - Delete a book (auth)
//!
//! List query parameters:
//! - `title`, `publication_year`, `author` - exact filters
//! - `search` - substring of the title or the author's name
//! - `ordering` - `title`, `-title`, `publication_year` or `-publication_year`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{Book, BookFilter, BookOrdering, CreateBookInput, UpdateBookInput};

/// Anonymous read routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/{id}", get(get_book))
}

/// Write routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/books", axum::routing::post(create_book))
        .route(
            "/books/{id}",
            axum::routing::put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
}

/// Build a [`BookFilter`] from raw query parameters.
///
/// Integer filters that do not parse are rejected with the offending field
/// named in the error details. Empty values are treated as absent.
pub fn parse_book_filter(params: &HashMap<String, String>) -> Result<BookFilter, ApiError> {
    fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
        params.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    let publication_year = non_empty(params, "publication_year")
        .map(|v| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| ApiError::field_error("publication_year", "Enter a whole number."))
        })
        .transpose()?;

    let author_id = non_empty(params, "author")
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::field_error("author", "Enter a whole number."))
        })
        .transpose()?;

    Ok(BookFilter {
        title: non_empty(params, "title").map(str::to_string),
        publication_year,
        author_id,
        search: params.get("search").cloned(),
        ordering: BookOrdering::parse_or_default(params.get("ordering").map(String::as_str)),
    })
}

/// GET /api/v1/books
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let filter = parse_book_filter(&params)?;
    let books = state.book_service.list(&filter).await?;
    Ok(Json(books))
}

/// GET /api/v1/books/{id}
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let book = state.book_service.get(id).await?;
    Ok(Json(book))
}

/// POST /api/v1/books
async fn create_book(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateBookInput>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.book_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT|PATCH /api/v1/books/{id}
async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateBookInput>,
) -> Result<Json<Book>, ApiError> {
    let book = state.book_service.update(id, body).await?;
    Ok(Json(book))
}

/// DELETE /api/v1/books/{id}
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.book_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
