//! Role-gated views
//!
//! - GET /api/v1/views/admin - Admin only
//! - GET /api/v1/views/librarian - Librarian only
//! - GET /api/v1/views/member - Member only
//!
//! Each route is wrapped in its own role gate; see [`build_api_router`].
//!
//! [`build_api_router`]: crate::api::build_api_router

use axum::Json;
use serde::Serialize;

use crate::api::middleware::AuthenticatedUser;
use crate::models::UserRole;

/// Greeting returned by a role-gated view
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: String,
    pub username: String,
    pub message: String,
}

impl ViewResponse {
    fn new(role: UserRole, user: &crate::models::User) -> Self {
        Self {
            view: role.to_string(),
            username: user.username.clone(),
            message: format!("Welcome to the {} view, {}.", role, user.username),
        }
    }
}

/// GET /api/v1/views/admin
pub async fn admin_view(AuthenticatedUser(user): AuthenticatedUser) -> Json<ViewResponse> {
    Json(ViewResponse::new(UserRole::Admin, &user))
}

/// GET /api/v1/views/librarian
pub async fn librarian_view(AuthenticatedUser(user): AuthenticatedUser) -> Json<ViewResponse> {
    Json(ViewResponse::new(UserRole::Librarian, &user))
}

/// GET /api/v1/views/member
pub async fn member_view(AuthenticatedUser(user): AuthenticatedUser) -> Json<ViewResponse> {
    Json(ViewResponse::new(UserRole::Member, &user))
}
