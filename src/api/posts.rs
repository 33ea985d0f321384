//! Blog post API endpoints
//!
//! Handles HTTP requests for posts and their comments:
//! - GET /api/v1/posts - Posts, newest first
//! - GET /api/v1/posts/{id} - Post with tags and comments
//! - POST /api/v1/posts - Create a post (auth)
//! - PUT /api/v1/posts/{id} - Edit a post (author only)
//! - DELETE /api/v1/posts/{id} - Delete a post (author only)
//! - GET /api/v1/posts/{id}/comments - Comments on a post
//! - POST /api/v1/posts/{id}/comments - Comment on a post (auth)
//!
//! `tags` in a post body is either a comma-separated string or a JSON array
//! of names.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::{Comment, CommentInput, CreatePostInput, PostDetail, PostWithTags, UpdatePostInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/comments", get(list_comments))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", axum::routing::put(update_post).delete(delete_post))
        .route("/posts/{id}/comments", post(create_comment))
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostWithTags>>, ApiError> {
    let posts = state.post_service.list().await?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = state.post_service.get_detail(id).await?;
    Ok(Json(post))
}

/// POST /api/v1/posts
///
/// The caller becomes the author.
async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(body): ApiJson<CreatePostInput>,
) -> Result<(StatusCode, Json<PostWithTags>), ApiError> {
    let post = state.post_service.create(&user, body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/v1/posts/{id}
///
/// Providing `tags` replaces the post's tag set.
async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdatePostInput>,
) -> Result<Json<PostWithTags>, ApiError> {
    let post = state.post_service.update(&user, id, body).await?;
    Ok(Json(post))
}

/// DELETE /api/v1/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state.comment_service.list_for_post(id).await?;
    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state.comment_service.create(&user, id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
