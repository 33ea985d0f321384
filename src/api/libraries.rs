//! Library API endpoints
//!
//! Handles HTTP requests for libraries:
//! - GET /api/v1/libraries - List libraries
//! - GET /api/v1/libraries/{id} - Library with its books and librarian
//! - POST /api/v1/libraries - Create a library (auth)
//! - POST /api/v1/libraries/{id}/books - Add a catalogue book (auth)
//! - PUT /api/v1/libraries/{id}/librarian - Assign the librarian (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{
    AddLibraryBookInput, AssignLibrarianInput, CreateLibraryInput, Librarian, Library,
    LibraryDetail,
};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/libraries", get(list_libraries))
        .route("/libraries/{id}", get(get_library))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/libraries", post(create_library))
        .route("/libraries/{id}/books", post(add_book))
        .route("/libraries/{id}/librarian", put(assign_librarian))
}

/// GET /api/v1/libraries
async fn list_libraries(State(state): State<AppState>) -> Result<Json<Vec<Library>>, ApiError> {
    let libraries = state.library_service.list().await?;
    Ok(Json(libraries))
}

/// GET /api/v1/libraries/{id}
async fn get_library(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LibraryDetail>, ApiError> {
    let detail = state.library_service.get_detail(id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/libraries
async fn create_library(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateLibraryInput>,
) -> Result<(StatusCode, Json<Library>), ApiError> {
    let library = state.library_service.create(&body.name).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// POST /api/v1/libraries/{id}/books
///
/// Adding a book that is already on the shelf is a no-op.
async fn add_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AddLibraryBookInput>,
) -> Result<Json<LibraryDetail>, ApiError> {
    let detail = state.library_service.add_book(id, body.book_id).await?;
    Ok(Json(detail))
}

/// PUT /api/v1/libraries/{id}/librarian
async fn assign_librarian(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AssignLibrarianInput>,
) -> Result<Json<Librarian>, ApiError> {
    let librarian = state.library_service.assign_librarian(id, &body.name).await?;
    Ok(Json(librarian))
}
