//! API layer - HTTP handlers and routing
//!
//! All endpoints are JSON and mounted under `/api/v1`:
//! - Book catalogue: books, authors
//! - Libraries and role-gated views
//! - Accounts: auth, profile, role administration
//! - Blog: posts, comments, tags, search

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod comments;
pub mod libraries;
pub mod middleware;
pub mod posts;
pub mod search;
pub mod tags;
pub mod views;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, Uri},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route("/views/admin", get(views::admin_view))
        .route_layer(axum_middleware::from_fn(middleware::require_role_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let librarian_routes = Router::new()
        .route("/views/librarian", get(views::librarian_view))
        .route_layer(axum_middleware::from_fn(middleware::require_role_librarian))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let member_routes = Router::new()
        .route("/views/member", get(views::member_view))
        .route_layer(axum_middleware::from_fn(middleware::require_role_member))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth, any role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .merge(books::protected_router())
        .merge(authors::protected_router())
        .merge(libraries::protected_router())
        .merge(posts::protected_router())
        .merge(comments::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::public_router())
        .merge(books::public_router())
        .merge(authors::public_router())
        .merge(libraries::public_router())
        .merge(posts::public_router())
        .merge(tags::router())
        .merge(search::router())
        .merge(admin_routes)
        .merge(librarian_routes)
        .merge(member_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configuration for cookie authentication
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin: {}", cors_origin),
    }

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    crate::db::ping(&state.pool).await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::new("SERVICE_UNAVAILABLE", "Database unavailable")
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn app() -> Router {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        build_router(AppState::new(pool, 7), "http://localhost:3000")
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/books")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_guarded_routes_require_session() {
        let app = app().await;

        for (method, uri) in [
            (Method::POST, "/api/v1/authors"),
            (Method::POST, "/api/v1/libraries"),
            (Method::GET, "/api/v1/views/member"),
            (Method::PUT, "/api/v1/admin/users/1/role"),
            (Method::GET, "/api/v1/auth/profile"),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_invalid_cors_origin_does_not_panic() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let response = build_router(AppState::new(pool, 7), "not a\nvalid origin")
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
