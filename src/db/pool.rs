//! Database connection pool
//!
//! Librarium stores everything in a single SQLite database. The pool is created
//! from [`DatabaseConfig`] and always runs with foreign keys enabled so that
//! cascading deletes (author -> books, post -> comments) are enforced.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Shared pool handle used by every repository
pub type DbPool = SqlitePool;

/// Normalize a configured database location into a sqlx connection URL
fn connection_url(url: &str) -> String {
    if url == ":memory:" || url == "sqlite::memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    }
}

fn is_memory(url: &str) -> bool {
    url.contains(":memory:")
}

/// Create the parent directory for a file-based database
fn ensure_parent_dir(url: &str) -> Result<()> {
    if is_memory(url) {
        return Ok(());
    }

    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }

    Ok(())
}

/// Create a database connection pool based on configuration.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the connection cannot be
/// established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    ensure_parent_dir(&config.url)?;

    let url = connection_url(&config.url);
    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid SQLite URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `sqlite::memory:` opens a fresh database, so an
    // in-memory pool must hold exactly one connection for its whole life.
    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if is_memory(&url) {
        pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", config.url))?;

    Ok(pool)
}

/// Check that the database answers queries
pub async fn ping(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DbPool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        max_connections: 1,
    };
    create_pool(&config).await
}
