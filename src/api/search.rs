//! Post search
//!
//! - GET /api/v1/search?q= - Posts whose title, content or tag names contain `q`

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::PostWithTags;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<PostWithTags>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search_posts))
}

/// A blank query returns no results.
async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.post_service.search(&query.q).await?;
    Ok(Json(SearchResponse {
        query: query.q,
        results,
    }))
}
