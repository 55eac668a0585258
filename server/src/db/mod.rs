//! Database Layer
//!
//! `PostgreSQL` connection pool, migrations, models, and query functions.
//! Query functions are the only place SQL lives; the access engine and
//! the HTTP handlers go through them.

mod models;
mod queries;

use std::time::Duration;

use anyhow::Result;
pub use models::*;
pub use queries::*;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Open the `PostgreSQL` pool the whole server shares.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        // A couple of warm connections cover the idle-site baseline
        .min_connections(2)
        .max_connections(20)
        // Fail fast when the pool is exhausted instead of queueing
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        // Catch connections the server dropped while we idled
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Apply any pending migrations from `server/migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
