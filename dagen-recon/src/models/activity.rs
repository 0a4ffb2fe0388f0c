//! The activity capability set
//!
//! Account and submission activity share one operation contract but differ
//! in fields and in what feeds their semantic hash. The reconciler, batch
//! loader and dispatcher only ever see this trait; the two implementations
//! are the closed set of record kinds the service understands.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use dagen_common::Result;

use crate::cache::EnrichmentContext;

/// Max observed version for one (batch, provider) group
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchKeyVersion {
    pub batch_name: String,
    pub provider: String,
    pub version: u32,
}

/// One activity record kind: parsing, identity, and its store operations.
///
/// The semantic hash is the record's identity across versions of a batch,
/// not a storage key. Two records with equal identity fields always hash
/// equal; the store layer never sees the hash.
#[async_trait]
pub trait Activity: Clone + Send + Sync + Unpin + 'static {
    /// Kind label used in logs
    const KIND: &'static str;
    /// Advice file extension for this kind
    const FILE_EXT: &'static str;

    /// Parse one line of an advice file
    fn parse_line(line: &str) -> Result<Self>;

    /// Populate enrichment fields before the semantic hash is taken.
    /// No-op for kinds without enrichment.
    async fn enrich(&mut self, _ctx: &EnrichmentContext) -> Result<()> {
        Ok(())
    }

    /// Deterministic fingerprint of the identity-defining fields
    fn semantic_hash(&self) -> u32;

    fn batch_name(&self) -> &str;
    fn provider(&self) -> &str;
    fn version(&self) -> u32;
    fn activity_time(&self) -> DateTime<Utc>;
    fn activity_type(&self) -> &str;
    fn category_id(&self) -> &str;
    fn amount(&self) -> f64;
    fn set_amount(&mut self, amount: f64);
    fn last_modified(&self) -> DateTime<Utc>;
    fn set_last_modified(&mut self, at: DateTime<Utc>);

    /// Insert one record on an open connection (used inside batch
    /// transactions).
    async fn insert(conn: &mut SqliteConnection, record: &Self) -> Result<()>;

    /// Insert one record through the pool
    async fn insert_one(pool: &SqlitePool, record: &Self) -> Result<()> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, record).await
    }

    /// All records stored for one exact (batch, provider, version) triple
    async fn fetch_version(
        pool: &SqlitePool,
        batch_name: &str,
        provider: &str,
        version: u32,
    ) -> Result<Vec<Self>>;

    /// All records stored for a (batch, provider), newest version first
    async fn fetch_history(pool: &SqlitePool, batch_name: &str, provider: &str)
        -> Result<Vec<Self>>;

    /// Row count for a (batch, provider)
    async fn count(pool: &SqlitePool, batch_name: &str, provider: &str) -> Result<i64>;

    /// Max version per (batch, provider) group, for version table bootstrap
    async fn max_versions(pool: &SqlitePool) -> Result<Vec<BatchKeyVersion>>;
}
