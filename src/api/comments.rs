//! Comment API endpoints
//!
//! - PUT /api/v1/comments/{id} - Edit a comment (author only)
//! - DELETE /api/v1/comments/{id} - Delete a comment (author only)
//!
//! Listing and creating comments live under the post routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::{Comment, CommentInput};

/// Build comment routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/comments/{id}", put(update_comment).delete(delete_comment))
}

async fn update_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state.comment_service.update(&user, id, &body.content).await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
