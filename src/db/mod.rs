//! Database layer
//!
//! SQLite connection pool, code-embedded migrations, and one repository per
//! entity.
//!
//! # Usage
//!
//! ```ignore
//! use librarium::config::DatabaseConfig;
//! use librarium::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping, DbPool};
