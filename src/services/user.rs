//! User service
//!
//! Accounts and sessions:
//! - registration (first user becomes Admin, everyone else Member)
//! - login/logout with opaque session tokens
//! - session validation, deleting expired sessions on sight
//! - profile updates and role administration

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, UpdateProfileInput, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Bad credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Invalid input for one field
    #[error("Validation error: {message}")]
    ValidationError { field: &'static str, message: String },

    /// Username or email already taken
    #[error("User already exists: {message}")]
    UserExists { field: &'static str, message: String },

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl UserServiceError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }
}

/// User service for account and session management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the default session expiration
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with a custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Session lifetime in days, used for cookie `Max-Age`
    pub fn session_expiration_days(&self) -> i64 {
        self.session_expiration_days
    }

    /// Register a new user and log them in.
    ///
    /// The first registered user becomes Admin; everyone after that starts as
    /// Member. Emails are stored lowercase and compared case-insensitively.
    ///
    /// # Errors
    /// - `ValidationError` for empty fields, an email without `@`, or
    ///   mismatched passwords
    /// - `UserExists` if the username or email is taken
    pub async fn register(&self, input: RegisterInput) -> Result<(User, Session), UserServiceError> {
        validate_register_input(&input)?;

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();

        if self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists {
                field: "username",
                message: format!("Username '{}' is already taken", username),
            });
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists {
                field: "email",
                message: format!("Email '{}' is already registered", email),
            });
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create_first_as_admin(&User::new(username, email, password_hash, UserRole::Member))
            .await
            .context("Failed to create user")?;

        let session = self.create_session(user.id).await?;
        tracing::info!("Registered user {} with role {}", user.username, user.role);

        Ok((user, session))
    }

    /// Log in by username or email.
    ///
    /// # Errors
    /// - `AuthenticationError` for an unknown user or wrong password
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let user = self
            .find_user_by_username_or_email(input.username_or_email.trim())
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!("Rejected login for {}", user.username);
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;
        Ok((user, session))
    }

    /// Delete a session
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// deleted.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Update the caller's profile.
    ///
    /// Blank `avatar` clears it. A new email must contain `@` and not belong
    /// to another user.
    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut updated = user.clone();

        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            if email.is_empty() {
                return Err(UserServiceError::invalid("email", "Email cannot be empty"));
            }
            if !email.contains('@') {
                return Err(UserServiceError::invalid("email", "Invalid email format"));
            }
            if let Some(other) = self
                .user_repo
                .get_by_email(&email)
                .await
                .context("Failed to check email")?
            {
                if other.id != user.id {
                    return Err(UserServiceError::UserExists {
                        field: "email",
                        message: format!("Email '{}' is already registered", email),
                    });
                }
            }
            updated.email = email;
        }
        if let Some(first_name) = input.first_name {
            updated.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = input.last_name {
            updated.last_name = last_name.trim().to_string();
        }
        if let Some(bio) = input.bio {
            updated.bio = bio;
        }
        if let Some(avatar) = input.avatar {
            let avatar = avatar.trim();
            updated.avatar = if avatar.is_empty() {
                None
            } else {
                Some(avatar.to_string())
            };
        }

        let saved = self
            .user_repo
            .update(&updated)
            .await
            .context("Failed to update user")?;
        Ok(saved)
    }

    /// Change a user's role
    pub async fn set_role(&self, user_id: i64, role: UserRole) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .set_role(user_id, role)
            .await
            .context("Failed to set role")?
            .ok_or(UserServiceError::NotFound(user_id))?;

        tracing::info!("User {} is now {}", user.username, user.role);
        Ok(user)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

fn validate_register_input(input: &RegisterInput) -> Result<(), UserServiceError> {
    if input.username.trim().is_empty() {
        return Err(UserServiceError::invalid("username", "Username cannot be empty"));
    }
    if input.email.trim().is_empty() {
        return Err(UserServiceError::invalid("email", "Email cannot be empty"));
    }
    if !input.email.contains('@') {
        return Err(UserServiceError::invalid("email", "Invalid email format"));
    }
    if input.password.is_empty() {
        return Err(UserServiceError::invalid("password", "Password cannot be empty"));
    }
    if input.password != input.password_confirm {
        return Err(UserServiceError::invalid(
            "password_confirm",
            "Passwords do not match",
        ));
    }
    Ok(())
}

/// Input for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterInput {
    /// Registration input whose confirmation matches the password
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            password_confirm: password.clone(),
            password,
        }
    }
}

/// Input for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DbPool};

    async fn setup_test_service() -> (DbPool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        (pool, UserService::new(user_repo, session_repo))
    }

    // ========================================================================
    // Registration tests
    // ========================================================================

    #[tokio::test]
    async fn test_register_first_user_becomes_admin() {
        let (_pool, service) = setup_test_service().await;

        let (first, session) = service
            .register(RegisterInput::new("admin", "admin@example.com", "password123"))
            .await
            .expect("Failed to register");
        let (second, _) = service
            .register(RegisterInput::new("reader", "reader@example.com", "password456"))
            .await
            .expect("Failed to register second user");

        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(second.role, UserRole::Member);
        assert_eq!(session.user_id, first.id);
    }

    #[tokio::test]
    async fn test_register_stores_email_lowercase() {
        let (_pool, service) = setup_test_service().await;

        let (user, _) = service
            .register(RegisterInput::new("reader", "Reader@Example.COM", "pw"))
            .await
            .unwrap();
        assert_eq!(user.email, "reader@example.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_ignores_case() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("one", "same@example.com", "pw"))
            .await
            .unwrap();

        let result = service
            .register(RegisterInput::new("two", "SAME@example.com", "pw"))
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::UserExists { field: "email", .. })
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_fails() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("reader", "a@example.com", "pw"))
            .await
            .unwrap();

        let result = service
            .register(RegisterInput::new("reader", "b@example.com", "pw"))
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::UserExists { field: "username", .. })
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_passwords() {
        let (_pool, service) = setup_test_service().await;

        let mut input = RegisterInput::new("reader", "reader@example.com", "pw1");
        input.password_confirm = "pw2".to_string();

        let result = service.register(input).await;
        assert!(matches!(
            result,
            Err(UserServiceError::ValidationError { field: "password_confirm", .. })
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .register(RegisterInput::new("reader", "not-an-email", "pw"))
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::ValidationError { field: "email", .. })
        ));
    }

    // ========================================================================
    // Login / session tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("reader", "reader@example.com", "secret"))
            .await
            .unwrap();

        let (by_name, _) = service.login(LoginInput::new("reader", "secret")).await.unwrap();
        let (by_email, _) = service
            .login(LoginInput::new("READER@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(by_name.id, by_email.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("reader", "reader@example.com", "secret"))
            .await
            .unwrap();

        let result = service.login(LoginInput::new("reader", "wrong")).await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));

        let result = service.login(LoginInput::new("ghost", "secret")).await;
        assert!(matches!(result, Err(UserServiceError::AuthenticationError(_))));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;
        let (user, session) = service
            .register(RegisterInput::new("reader", "reader@example.com", "secret"))
            .await
            .unwrap();

        let resolved = service.validate_session(&session.id).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let (pool, _) = setup_test_service().await;
        let service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            -1,
        );
        let (_user, session) = service
            .register(RegisterInput::new("reader", "reader@example.com", "secret"))
            .await
            .unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
    }

    // ========================================================================
    // Profile / role tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_profile() {
        let (_pool, service) = setup_test_service().await;
        let (user, _) = service
            .register(RegisterInput::new("reader", "reader@example.com", "secret"))
            .await
            .unwrap();

        let updated = service
            .update_profile(
                &user,
                UpdateProfileInput {
                    first_name: Some(" Ada ".to_string()),
                    email: Some("Ada@Example.com".to_string()),
                    bio: Some("Loves books".to_string()),
                    avatar: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.bio, "Loves books");
        assert!(updated.avatar.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("one", "one@example.com", "pw"))
            .await
            .unwrap();
        let (two, _) = service
            .register(RegisterInput::new("two", "two@example.com", "pw"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                &two,
                UpdateProfileInput {
                    email: Some("ONE@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(UserServiceError::UserExists { .. })));

        let same = service
            .update_profile(
                &two,
                UpdateProfileInput {
                    email: Some("two@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_set_role() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("admin", "admin@example.com", "pw"))
            .await
            .unwrap();
        let (reader, _) = service
            .register(RegisterInput::new("reader", "reader@example.com", "pw"))
            .await
            .unwrap();

        let promoted = service.set_role(reader.id, UserRole::Librarian).await.unwrap();
        assert_eq!(promoted.role, UserRole::Librarian);

        let missing = service.set_role(999, UserRole::Member).await;
        assert!(matches!(missing, Err(UserServiceError::NotFound(999))));
    }
}
