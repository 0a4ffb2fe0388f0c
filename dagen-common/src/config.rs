//! Service configuration loading
//!
//! One TOML file, read once at startup and immutable afterwards. A missing
//! or unreadable file is a startup failure with no partial operation; the
//! binary maps it to a distinct exit code.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Service configuration model
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub io: IoConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub service: ServiceParams,
}

/// Input/output directories
#[derive(Debug, Clone, Deserialize)]
pub struct IoConfig {
    /// Directory the paired advice files are dropped into
    pub advice_dir: PathBuf,
    /// Directory the reference transaction CSV files are dropped into
    pub transaction_dir: PathBuf,
}

/// Store connection strings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Data store (full record history + reference transactions)
    pub data_url: String,
    /// Delta store (delta feed, write-only for this service)
    pub delta_url: String,
}

/// Tunable service parameters, all defaulted
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceParams {
    /// Worker tasks per record kind
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Sleep between rounds, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Capacity of the enrichment LRU cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Rows per bulk insert chunk during transaction ingest
    #[serde(default = "default_tx_chunk_size")]
    pub tx_chunk_size: usize,
}

fn default_workers() -> usize {
    4
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_cache_capacity() -> usize {
    128
}

fn default_tx_chunk_size() -> usize {
    512
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_interval_secs: default_poll_interval_secs(),
            cache_capacity: default_cache_capacity(),
            tx_chunk_size: default_tx_chunk_size(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate the configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ServiceConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.service.workers == 0 {
            return Err(Error::Config("service.workers must be at least 1".into()));
        }
        if self.service.tx_chunk_size == 0 {
            return Err(Error::Config("service.tx_chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}
