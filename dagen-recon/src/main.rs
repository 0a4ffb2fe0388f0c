//! dagen-recon - Delta Activity Generation Service
//!
//! Continuously reconciles paired advice file drops into a versioned
//! record store and a net-change delta feed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dagen_common::config::ServiceConfig;
use dagen_recon::services::RoundController;
use dagen_recon::ReconContext;

/// Exit code for a missing or invalid configuration file
const EXIT_CONFIG: i32 = 2;

#[derive(Parser)]
#[command(name = "dagen-recon", about = "Delta activity generation service")]
struct Cli {
    /// Path to the service configuration file
    #[arg(long, env = "DAGEN_CONFIG", default_value = "config/service.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting dagen-recon (Delta Activity Generation)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = match ServiceConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(config = %cli.config.display(), error = %e, "cannot load configuration");
            std::process::exit(EXIT_CONFIG);
        }
    };
    info!(
        advice_dir = %config.io.advice_dir.display(),
        transaction_dir = %config.io.transaction_dir.display(),
        workers = config.service.workers,
        "configuration loaded"
    );

    let ctx = Arc::new(ReconContext::init(config).await?);
    RoundController::new(ctx).run().await?;

    Ok(())
}
