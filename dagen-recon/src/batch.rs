//! Deduplicated record batches
//!
//! One batch holds everything loaded from exactly one advice file, keyed by
//! semantic hash. All records in a file share one (batch name, provider,
//! version) triple, so any entry can answer for the whole batch. Batches
//! are owned by the worker that loads them and never cross shard
//! boundaries.

use std::collections::HashMap;
use std::path::Path;

use sqlx::SqlitePool;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use dagen_common::Result;

use crate::cache::EnrichmentContext;
use crate::models::Activity;

/// The (batch name, provider, version) triple shared by every record in a
/// batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchKey {
    pub batch_name: String,
    pub provider: String,
    pub version: u32,
}

/// Records of one advice file, deduplicated by semantic hash
pub struct Batch<A: Activity> {
    records: HashMap<u32, A>,
}

impl<A: Activity> Batch<A> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Stream an advice file line by line into a fresh batch.
    ///
    /// Enrichment runs before the semantic hash is taken, so hashes line up
    /// with what was stored for earlier versions. The first record wins a
    /// hash; later duplicates in the same file are dropped silently. Any
    /// malformed line fails the whole load; a half-parsed batch must never
    /// reach version comparison.
    pub async fn load_file(path: &Path, enrich: &EnrichmentContext) -> Result<Self> {
        let file = File::open(path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut batch = Self::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let mut record = A::parse_line(&line)?;
            record.enrich(enrich).await?;
            let hash = record.semantic_hash();
            batch.records.entry(hash).or_insert(record);
        }

        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The file-wide key triple, read off any record
    pub fn key(&self) -> Option<BatchKey> {
        self.records.values().next().map(|r| BatchKey {
            batch_name: r.batch_name().to_string(),
            provider: r.provider().to_string(),
            version: r.version(),
        })
    }

    pub fn contains(&self, hash: u32) -> bool {
        self.records.contains_key(&hash)
    }

    pub fn get(&self, hash: u32) -> Option<&A> {
        self.records.get(&hash)
    }

    /// Take a record out of the batch once it has been reconciled
    pub fn remove(&mut self, hash: u32) -> Option<A> {
        self.records.remove(&hash)
    }

    pub fn records(&self) -> impl Iterator<Item = &A> {
        self.records.values()
    }

    /// Insert the whole batch into a store in one transaction
    pub async fn insert_to_store(&self, pool: &SqlitePool) -> Result<()> {
        let mut tx = pool.begin().await?;
        for record in self.records.values() {
            A::insert(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
