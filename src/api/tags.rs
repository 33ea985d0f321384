//! Tag API endpoints
//!
//! Handles HTTP requests for tags:
//! - GET /api/v1/tags - All tags with post counts
//! - GET /api/v1/tags/{slug}/posts - Posts with a tag

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{PostWithTags, TagWithCount};

/// Response for the posts of one tag
#[derive(Debug, Serialize)]
pub struct TagPostsResponse {
    pub tag: crate::models::Tag,
    pub posts: Vec<PostWithTags>,
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/{slug}/posts", get(get_tag_posts))
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags))
}

/// GET /api/v1/tags/{slug}/posts
///
/// Unknown slugs are a 404.
async fn get_tag_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TagPostsResponse>, ApiError> {
    let tag = state.tag_service.get_by_slug(&slug).await?;
    let posts = state.post_service.list_by_tag(tag.id).await?;
    Ok(Json(TagPostsResponse { tag, posts }))
}
