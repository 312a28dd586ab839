//! Repositories for the metadata store
//!
//! `repository` holds the store-agnostic trait, `files` the PostgreSQL implementation
//! and `memory` an in-process implementation used when no database is configured
//! and by tests.

pub mod files;
pub mod memory;
pub mod repository;

pub use files::PgFileRepository;
pub use memory::InMemoryFileRepository;
pub use repository::{FileRepository, LookupField};

use anyhow::Context;
use intake_core::config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Connect to the configured PostgreSQL database
pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let url = config
        .url
        .as_deref()
        .context("DATABASE_URL must be set when the metadata store is enabled")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}
