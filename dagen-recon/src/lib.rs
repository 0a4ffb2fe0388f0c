//! dagen-recon library interface
//!
//! The reconciliation engine behind the dagen-recon binary: batch loading,
//! enrichment cache, version/lock table, pairing, sharded dispatch, delta
//! reconciliation and the round controller.

pub mod batch;
pub mod cache;
pub mod models;
pub mod services;
pub mod versions;

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use dagen_common::config::ServiceConfig;
use dagen_common::db::{init_data_store, init_delta_store};
use dagen_common::Result;

use crate::cache::{EnrichmentCache, EnrichmentContext};
use crate::models::{AccountActivity, Activity, SubmissionActivity};
use crate::versions::VersionTable;

/// Long-lived process state shared by every worker invocation
pub struct ReconContext {
    pub config: ServiceConfig,
    pub data_db: SqlitePool,
    pub delta_db: SqlitePool,
    pub versions: VersionTable,
    pub enrich: EnrichmentContext,
}

impl ReconContext {
    /// Connect both stores, build the version table from the data store's
    /// max-version aggregate, and set up the shared enrichment cache.
    pub async fn init(config: ServiceConfig) -> Result<Self> {
        let data_db = init_data_store(&config.database.data_url).await?;
        let delta_db = init_delta_store(&config.database.delta_url).await?;

        let mut known = AccountActivity::max_versions(&data_db).await?;
        known.extend(SubmissionActivity::max_versions(&data_db).await?);
        let versions = VersionTable::from_entries(known);
        let keys = versions.len().await;
        info!(keys, "version table loaded");

        let cache = Arc::new(EnrichmentCache::new(config.service.cache_capacity));
        let enrich = EnrichmentContext::new(cache, data_db.clone());

        Ok(Self {
            config,
            data_db,
            delta_db,
            versions,
            enrich,
        })
    }
}
