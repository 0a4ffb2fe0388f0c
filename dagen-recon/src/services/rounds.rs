//! Round controller
//!
//! Drives the repeating cycle: ingest reference transactions, pair the
//! advice directory, fan the admitted files out over the shard workers
//! (one task per shard per record kind), wait for all of them, delete
//! every admitted file, sleep, repeat. There is no shutdown signal; the
//! loop runs until the process is terminated. Any worker or file-system
//! error ends the process rather than isolating a shard.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use dagen_common::{Error, Result};

use crate::models::{AccountActivity, SubmissionActivity};
use crate::services::dispatch::run_shard;
use crate::services::pairing::{pair_directory, AdmittedFile};
use crate::services::tx_ingest::ingest_transaction_files;
use crate::ReconContext;

/// What one round touched
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundSummary {
    pub account_files: usize,
    pub submission_files: usize,
    pub transactions: usize,
}

/// The endless ingest-dispatch-delete-sleep loop
pub struct RoundController {
    ctx: Arc<ReconContext>,
}

impl RoundController {
    pub fn new(ctx: Arc<ReconContext>) -> Self {
        Self { ctx }
    }

    /// Run rounds until the process is killed
    pub async fn run(&self) -> Result<()> {
        let interval = Duration::from_secs(self.ctx.config.service.poll_interval_secs);
        info!(
            workers = self.ctx.config.service.workers,
            poll_secs = interval.as_secs(),
            "entering round loop"
        );
        loop {
            self.run_round().await?;
            tokio::time::sleep(interval).await;
        }
    }

    /// One full cycle. Separated out so tests can drive single rounds.
    pub async fn run_round(&self) -> Result<RoundSummary> {
        let started = Instant::now();
        let config = &self.ctx.config;

        let transactions = ingest_transaction_files(
            &config.io.transaction_dir,
            &self.ctx.data_db,
            config.service.tx_chunk_size,
        )
        .await?;

        let (accounts, submissions) = pair_directory(&config.io.advice_dir)?;
        let summary = RoundSummary {
            account_files: accounts.len(),
            submission_files: submissions.len(),
            transactions,
        };

        let accounts = Arc::new(accounts);
        let submissions = Arc::new(submissions);

        let mut workers = JoinSet::new();
        for shard in 0..config.service.workers {
            let files = accounts.clone();
            let ctx = self.ctx.clone();
            workers.spawn(async move { run_shard::<AccountActivity>(files, shard, ctx).await });

            let files = submissions.clone();
            let ctx = self.ctx.clone();
            workers.spawn(async move { run_shard::<SubmissionActivity>(files, shard, ctx).await });
        }
        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| Error::Internal(format!("worker task failed: {e}")))??;
        }

        // Admitted files are consumed whether or not they produced deltas.
        delete_files(&accounts)?;
        delete_files(&submissions)?;

        if summary.account_files + summary.submission_files + summary.transactions > 0 {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                account_files = summary.account_files,
                submission_files = summary.submission_files,
                transactions = summary.transactions,
                "round complete"
            );
        }
        Ok(summary)
    }
}

/// Delete processed files. A file that cannot be deleted would be
/// re-admitted and reprocessed next round, so failure here is fatal.
fn delete_files(files: &[AdmittedFile]) -> Result<()> {
    for file in files {
        if let Err(e) = std::fs::remove_file(&file.path) {
            error!(file = %file.name, error = %e, "failed to delete processed file");
            return Err(Error::Io(e));
        }
        debug!(file = %file.name, "deleted processed file");
    }
    Ok(())
}
