//! Store initialization
//!
//! The service writes to two stores: the data store keeps the full record
//! history per version plus the reference transactions, the delta store
//! receives only the computed delta feed. Each is one SQLite database with
//! its own pool. There is no transaction model spanning the two.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use super::schema;
use crate::Result;

/// Build a sqlite connection string for a database file, creating it on
/// first open.
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

async fn connect(url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;

    // WAL keeps concurrent shard writers from serializing on the file lock.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    Ok(pool)
}

/// Open the data store and create its tables if needed
pub async fn init_data_store(url: &str) -> Result<SqlitePool> {
    let pool = connect(url).await?;

    schema::create_account_activity_table(&pool).await?;
    schema::create_submission_activity_table(&pool).await?;
    schema::create_transactions_table(&pool).await?;

    info!(url, "data store ready");
    Ok(pool)
}

/// Open the delta store and create its tables if needed
pub async fn init_delta_store(url: &str) -> Result<SqlitePool> {
    let pool = connect(url).await?;

    schema::create_account_activity_table(&pool).await?;
    schema::create_submission_activity_table(&pool).await?;

    info!(url, "delta store ready");
    Ok(pool)
}
