//! Store initialization tests

use dagen_common::db::{init_data_store, init_delta_store, sqlite_url};
use tempfile::TempDir;

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn data_store_creates_all_tables() {
    let dir = TempDir::new().unwrap();
    let pool = init_data_store(&sqlite_url(&dir.path().join("data.db")))
        .await
        .unwrap();

    let tables = table_names(&pool).await;
    assert!(tables.contains(&"account_activity".to_string()));
    assert!(tables.contains(&"submission_activity".to_string()));
    assert!(tables.contains(&"transactions".to_string()));
}

#[tokio::test]
async fn delta_store_has_no_transactions_table() {
    let dir = TempDir::new().unwrap();
    let pool = init_delta_store(&sqlite_url(&dir.path().join("delta.db")))
        .await
        .unwrap();

    let tables = table_names(&pool).await;
    assert!(tables.contains(&"account_activity".to_string()));
    assert!(tables.contains(&"submission_activity".to_string()));
    assert!(!tables.contains(&"transactions".to_string()));
}

#[tokio::test]
async fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let url = sqlite_url(&dir.path().join("data.db"));

    let pool1 = init_data_store(&url).await.unwrap();
    sqlx::query(
        "INSERT INTO transactions (mrn, activity_type, internal_mrn, seller_of_record, partner, recorded_on)
         VALUES ('M1', 'Sale', 'M1', 'SOR', 'P', '2026-01-01')",
    )
    .execute(&pool1)
    .await
    .unwrap();
    pool1.close().await;

    // Reopening must keep existing rows.
    let pool2 = init_data_store(&url).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
