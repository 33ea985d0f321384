//! Admin API endpoints
//!
//! - PUT /api/v1/admin/users/{id}/role - Change a user's role
//!
//! Mounted behind the admin role gate.

use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Deserialize;

use crate::api::auth::UserResponse;
use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::models::UserRole;

/// Request for changing a role
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}/role", put(set_user_role))
}

/// PUT /api/v1/admin/users/{id}/role
async fn set_user_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<SetRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role: UserRole = body
        .role
        .parse()
        .map_err(|_| ApiError::field_error("role", "Role must be admin, librarian or member"))?;

    let user = state.user_service.set_role(id, role).await?;
    Ok(Json(user.into()))
}
