//! Table schemas for the data and delta stores
//!
//! Both stores carry the two activity tables with identical shapes; the
//! reference transaction table exists only in the data store. All statements
//! are idempotent.

use sqlx::SqlitePool;

use crate::Result;

/// Account activity rows, one table shape shared by both stores
pub async fn create_account_activity_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS account_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_name TEXT NOT NULL,
            provider TEXT NOT NULL,
            version INTEGER NOT NULL,
            activity_type TEXT NOT NULL,
            activity_time TEXT NOT NULL,
            merchant_id TEXT NOT NULL,
            currency TEXT NOT NULL,
            amount REAL NOT NULL,
            downloaded_time TEXT NOT NULL,
            last_modified_time TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_account_activity_batch
         ON account_activity (batch_name, provider, version)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Submission activity rows, account shape plus the enrichment columns
pub async fn create_submission_activity_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS submission_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_name TEXT NOT NULL,
            provider TEXT NOT NULL,
            version INTEGER NOT NULL,
            activity_type TEXT NOT NULL,
            activity_time TEXT NOT NULL,
            merchant_id TEXT NOT NULL,
            currency TEXT NOT NULL,
            amount REAL NOT NULL,
            downloaded_time TEXT NOT NULL,
            last_modified_time TEXT NOT NULL,
            merchant_reference_number TEXT NOT NULL,
            internal_mrn TEXT NOT NULL DEFAULT '',
            seller_of_record TEXT NOT NULL DEFAULT '',
            partner TEXT NOT NULL DEFAULT ''
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submission_activity_batch
         ON submission_activity (batch_name, provider, version)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Reference transactions used to enrich submission activity
pub async fn create_transactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mrn TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            internal_mrn TEXT NOT NULL,
            seller_of_record TEXT NOT NULL,
            partner TEXT NOT NULL,
            recorded_on TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_mrn
         ON transactions (mrn, activity_type)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
