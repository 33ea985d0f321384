//! API middleware
//!
//! Shared application state, the JSON error type, session authentication
//! and role gates.
//!
//! Role gates compare the caller's role for equality. They must be layered
//! after [`require_auth`] so the [`AuthenticatedUser`] extension is present:
//!
//! ```ignore
//! Router::new()
//!     .route("/views/librarian", get(views::librarian_view))
//!     .route_layer(from_fn(require_role_librarian))
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::{
    SqlxAuthorRepository, SqlxBookRepository, SqlxCommentRepository, SqlxLibraryRepository,
    SqlxPostRepository, SqlxSessionRepository, SqlxTagRepository, SqlxUserRepository,
};
use crate::db::DbPool;
use crate::models::{User, UserRole};
use crate::services::{
    AuthorService, AuthorServiceError, BookService, BookServiceError, CommentService,
    CommentServiceError, LibraryService, LibraryServiceError, PostService, PostServiceError,
    TagService, TagServiceError, UserService, UserServiceError,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub user_service: Arc<UserService>,
    pub author_service: Arc<AuthorService>,
    pub book_service: Arc<BookService>,
    pub library_service: Arc<LibraryService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub tag_service: Arc<TagService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DbPool, session_expiration_days: i64) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let book_repo = SqlxBookRepository::boxed(pool.clone());
        let library_repo = SqlxLibraryRepository::boxed(pool.clone());
        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let tag_repo = SqlxTagRepository::boxed(pool.clone());

        Self {
            user_service: Arc::new(UserService::with_session_expiration(
                user_repo,
                session_repo,
                session_expiration_days,
            )),
            author_service: Arc::new(AuthorService::new(author_repo.clone(), book_repo.clone())),
            book_service: Arc::new(BookService::new(book_repo.clone(), author_repo)),
            library_service: Arc::new(LibraryService::new(library_repo, book_repo)),
            post_service: Arc::new(PostService::new(
                post_repo.clone(),
                tag_repo.clone(),
                comment_repo.clone(),
            )),
            comment_service: Arc::new(CommentService::new(comment_repo, post_repo)),
            tag_service: Arc::new(TagService::new(tag_repo)),
            pool,
        }
    }
}

/// The user resolved from the request's session token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Validation error scoped to one field: `details: {"<field>": ["<message>"]}`
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut details = serde_json::Map::new();
        details.insert(field.to_string(), serde_json::json!([message.clone()]));
        Self::with_details("VALIDATION_ERROR", message, serde_json::Value::Object(details))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut details = serde_json::Map::new();
        details.insert(field.to_string(), serde_json::json!([message.clone()]));
        Self::with_details("CONFLICT", message, serde_json::Value::Object(details))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log an internal error and hide its details from the client
    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            UserServiceError::UserExists { field, message } => ApiError::conflict(field, message),
            UserServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            UserServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<BookServiceError> for ApiError {
    fn from(e: BookServiceError) -> Self {
        match e {
            BookServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            BookServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            BookServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<AuthorServiceError> for ApiError {
    fn from(e: AuthorServiceError) -> Self {
        match e {
            AuthorServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            AuthorServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            AuthorServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<LibraryServiceError> for ApiError {
    fn from(e: LibraryServiceError) -> Self {
        match e {
            LibraryServiceError::NotFound(_) => ApiError::not_found(e.to_string()),
            LibraryServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            LibraryServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(msg) => ApiError::not_found(msg),
            PostServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            PostServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            PostServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<CommentServiceError> for ApiError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NotFound(msg) => ApiError::not_found(msg),
            CommentServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            CommentServiceError::ValidationError { field, message } => {
                ApiError::field_error(field, message)
            }
            CommentServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(e: TagServiceError) -> Self {
        match e {
            TagServiceError::NotFound(slug) => {
                ApiError::not_found(format!("Tag '{}' not found", slug))
            }
            TagServiceError::InternalError(err) => ApiError::internal(err),
        }
    }
}

/// JSON body extractor whose rejections are [`ApiError`]s.
///
/// Missing or mistyped fields become a 400 `VALIDATION_ERROR` naming the
/// field, like any other field-scoped validation failure.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let text = e.body_text();
                let (field, message) = rejected_field(&text);
                ApiError::field_error(&field, message)
            }
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::validation_error("Request body is not valid JSON")
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::validation_error("Expected a JSON body with Content-Type: application/json")
            }
            other => ApiError::validation_error(other.body_text()),
        }
    }
}

/// Pull the offending field out of a serde deserialization message.
///
/// Handles `missing field `x`` and `x: invalid type ...` forms; anything
/// else is reported under `non_field_errors`.
fn rejected_field(text: &str) -> (String, String) {
    let detail = text
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(text);

    if let Some(rest) = detail.split_once("missing field `").map(|(_, rest)| rest) {
        if let Some((field, _)) = rest.split_once('`') {
            return (field.to_string(), "This field is required.".to_string());
        }
    }

    if let Some((path, message)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(' ') {
            let message = message
                .split(" at line ")
                .next()
                .unwrap_or(message)
                .to_string();
            return (path.to_string(), message);
        }
    }

    ("non_field_errors".to_string(), detail.to_string())
}

/// Extract a session token from `Authorization: Bearer` or the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    if name == SESSION_COOKIE && !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware: rejects requests without a valid session
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

fn check_role(request: &Request, role: UserRole) -> Result<(), ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.has_role(role) {
        return Err(ApiError::forbidden(format!("{} role required", role)));
    }
    Ok(())
}

/// Role gate: Admin only
pub async fn require_role_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    check_role(&request, UserRole::Admin)?;
    Ok(next.run(request).await)
}

/// Role gate: Librarian only
pub async fn require_role_librarian(request: Request, next: Next) -> Result<Response, ApiError> {
    check_role(&request, UserRole::Librarian)?;
    Ok(next.run(request).await)
}

/// Role gate: Member only
pub async fn require_role_member(request: Request, next: Next) -> Result<Response, ApiError> {
    check_role(&request, UserRole::Member)?;
    Ok(next.run(request).await)
}
