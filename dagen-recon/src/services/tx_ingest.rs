//! Reference transaction ingest
//!
//! CSV files dropped into the transaction directory are bulk-loaded into
//! the data store in fixed-size chunks, then deleted; re-reading them the
//! next round would duplicate rows in an append-only table. A malformed
//! row fails the ingest outright, the same corrupt-delivery stance the
//! advice loader takes.

use std::path::Path;

use sqlx::SqlitePool;
use tracing::info;

use dagen_common::{Error, Result};

use crate::models::TransactionRecord;

/// Ingest and consume every pending CSV file in the directory. Returns the
/// number of rows ingested.
pub async fn ingest_transaction_files(
    dir: &Path,
    data_db: &SqlitePool,
    chunk_size: usize,
) -> Result<usize> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();

    let mut total = 0;
    for path in files {
        total += ingest_file(&path, data_db, chunk_size).await?;
        tokio::fs::remove_file(&path).await?;
        info!(file = %path.display(), "consumed transaction file");
    }
    Ok(total)
}

async fn ingest_file(path: &Path, data_db: &SqlitePool, chunk_size: usize) -> Result<usize> {
    let owned = path.to_path_buf();
    let rows = tokio::task::spawn_blocking(move || -> Result<Vec<TransactionRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&owned)
            .map_err(|e| Error::Parse(format!("cannot open {}: {e}", owned.display())))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| Error::Parse(format!("bad CSV in {}: {e}", owned.display())))?;
            rows.push(TransactionRecord::from_csv_row(&record)?);
        }
        Ok(rows)
    })
    .await
    .map_err(|e| Error::Internal(format!("transaction ingest task failed: {e}")))??;

    for chunk in rows.chunks(chunk_size) {
        TransactionRecord::insert_chunk(data_db, chunk).await?;
    }

    info!(file = %path.display(), rows = rows.len(), "ingested reference transactions");
    Ok(rows.len())
}
