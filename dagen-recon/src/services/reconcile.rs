//! Delta reconciliation
//!
//! Compares a freshly loaded batch against the stored records of the same
//! key at its last confirmed version. Every prior record resolves to
//! exactly one of three outcomes:
//!
//! - present in both with a different amount: a delta record carrying the
//!   signed difference goes to the delta store;
//! - present in both with the same amount: nothing is emitted;
//! - gone from the current batch: the prior record goes to the delta store
//!   with its amount negated and a fresh last-modified timestamp.
//!
//! Matched entries are removed from the batch either way, so whatever
//! remains afterwards is genuinely new; the caller writes those to the
//! delta store unmodified.

use sqlx::SqlitePool;
use tracing::debug;

use dagen_common::{time, Result};

use crate::batch::{Batch, BatchKey};
use crate::models::Activity;

/// Outcome counts of one reconciliation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileStats {
    pub changed: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Reconcile `batch` against the stored version `last_ver` of the same
/// (batch name, provider). The caller must hold the key's version lock.
pub async fn reconcile_against_last<A: Activity>(
    batch: &mut Batch<A>,
    key: &BatchKey,
    last_ver: u32,
    data_db: &SqlitePool,
    delta_db: &SqlitePool,
) -> Result<ReconcileStats> {
    let now = time::now();
    let prior = A::fetch_version(data_db, &key.batch_name, &key.provider, last_ver).await?;
    debug!(
        kind = A::KIND,
        batch = %key.batch_name,
        provider = %key.provider,
        prior = prior.len(),
        last_ver,
        "comparing against stored version"
    );

    let mut stats = ReconcileStats::default();
    for old in prior {
        let hash = old.semantic_hash();
        match batch.remove(hash) {
            Some(current) => {
                let diff = current.amount() - old.amount();
                if diff != 0.0 {
                    let mut delta = current;
                    delta.set_amount(diff);
                    A::insert_one(delta_db, &delta).await?;
                    stats.changed += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
            None => {
                // Removed upstream: emit the reversal.
                let mut reversal = old;
                reversal.set_amount(-reversal.amount());
                reversal.set_last_modified(now);
                A::insert_one(delta_db, &reversal).await?;
                stats.removed += 1;
            }
        }
    }

    Ok(stats)
}
