//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite

use crate::db::DbPool;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, first_name, last_name, \
                            bio, avatar, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email, ignoring case
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update profile fields and email
    async fn update(&self, user: &User) -> Result<User>;

    /// Change a user's role
    async fn set_role(&self, id: i64, role: UserRole) -> Result<Option<User>>;

    /// Create a user, storing Admin instead of `user.role` when the table
    /// is empty. The emptiness check and the insert are one statement.
    async fn create_first_as_admin(&self, user: &User) -> Result<User>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get user where {}", clause))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, first_name, last_name,
                               bio, avatar, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_where("username = ?", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_where("LOWER(email) = LOWER(?)", email).await
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, first_name = ?, last_name = ?, bio = ?, avatar = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn set_role(&self, id: i64, role: UserRole) -> Result<Option<User>> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set user role")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn create_first_as_admin(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, first_name, last_name,
                               bio, avatar, created_at, updated_at)
            SELECT ?, ?, ?,
                   CASE WHEN EXISTS (SELECT 1 FROM users) THEN ? ELSE ? END,
                   ?, ?, ?, ?, ?, ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(UserRole::Admin.to_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after insert"))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn create_test_user(username: &str, email: &str) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            "hash123".to_string(),
            UserRole::Member,
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&create_test_user("reader", "reader@example.com"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "reader");
        assert_eq!(created.role, UserRole::Member);
        assert!(created.bio.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_email_ignores_case() {
        let repo = setup_test_repo().await;
        repo.create(&create_test_user("reader", "reader@example.com"))
            .await
            .unwrap();

        let found = repo.get_by_email("Reader@Example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.username), Some("reader".to_string()));
    }

    #[tokio::test]
    async fn test_get_by_username_not_found() {
        let repo = setup_test_repo().await;
        assert!(repo.get_by_username("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let repo = setup_test_repo().await;
        let mut user = repo
            .create(&create_test_user("reader", "reader@example.com"))
            .await
            .unwrap();

        user.first_name = "Ada".to_string();
        user.bio = "Reads a lot".to_string();
        user.avatar = Some("https://example.com/a.png".to_string());
        let updated = repo.update(&user).await.unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.bio, "Reads a lot");
        assert_eq!(updated.avatar.as_deref(), Some("https://example.com/a.png"));
    }

    #[tokio::test]
    async fn test_set_role() {
        let repo = setup_test_repo().await;
        let user = repo
            .create(&create_test_user("reader", "reader@example.com"))
            .await
            .unwrap();

        let updated = repo.set_role(user.id, UserRole::Librarian).await.unwrap();
        assert_eq!(updated.map(|u| u.role), Some(UserRole::Librarian));

        assert!(repo.set_role(999, UserRole::Admin).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_first_as_admin_only_promotes_first() {
        let repo = setup_test_repo().await;

        let first = repo
            .create_first_as_admin(&create_test_user("a", "a@example.com"))
            .await
            .unwrap();
        let second = repo
            .create_first_as_admin(&create_test_user("b", "b@example.com"))
            .await
            .unwrap();

        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(second.role, UserRole::Member);
        assert_eq!(second.username, "b");
    }

    #[tokio::test]
    async fn test_concurrent_first_registrations_yield_one_admin() {
        let repo = setup_test_repo().await;

        let (a, b, c) = (
            create_test_user("a", "a@example.com"),
            create_test_user("b", "b@example.com"),
            create_test_user("c", "c@example.com"),
        );
        let (a, b, c) = tokio::join!(
            repo.create_first_as_admin(&a),
            repo.create_first_as_admin(&b),
            repo.create_first_as_admin(&c),
        );

        let admins = [a.unwrap(), b.unwrap(), c.unwrap()]
            .iter()
            .filter(|u| u.role == UserRole::Admin)
            .count();
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let repo = setup_test_repo().await;
        repo.create(&create_test_user("reader", "a@example.com")).await.unwrap();

        let duplicate = repo.create(&create_test_user("reader", "b@example.com")).await;
        assert!(duplicate.is_err());
    }
}
