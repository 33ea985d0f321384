//! Author API endpoints
//!
//! - GET /api/v1/authors - Authors with their books
//! - GET /api/v1/authors/{id} - One author with books
//! - POST /api/v1/authors - Create an author (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::{AuthorWithBooks, CreateAuthorInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors))
        .route("/authors/{id}", get(get_author))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/authors", post(create_author))
}

async fn list_authors(State(state): State<AppState>) -> Result<Json<Vec<AuthorWithBooks>>, ApiError> {
    let authors = state.author_service.list().await?;
    Ok(Json(authors))
}

async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorWithBooks>, ApiError> {
    let author = state.author_service.get(id).await?;
    Ok(Json(author))
}

async fn create_author(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAuthorInput>,
) -> Result<(StatusCode, Json<AuthorWithBooks>), ApiError> {
    let author = state.author_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(author)))
}
