//! Sharded dispatch
//!
//! Admitted files are partitioned over N workers per record kind by an
//! FNV hash of the file name modulo N, so a file name always lands on the
//! same shard within a run regardless of its position in the listing.
//! Every worker walks the full admitted list and processes only its own
//! shard, sequentially, in admission order. Two files for the same batch
//! key can end up on different shards; the per-key version lock is what
//! makes that safe.

use tracing::{debug, info};

use dagen_common::hash::{batch_key_hash, shard_of};
use dagen_common::Result;

use crate::batch::Batch;
use crate::models::Activity;
use crate::services::pairing::AdmittedFile;
use crate::services::reconcile::reconcile_against_last;
use crate::ReconContext;

/// Process one shard's slice of the admitted files, in admission order
pub async fn run_shard<A: Activity>(
    files: std::sync::Arc<Vec<AdmittedFile>>,
    shard: usize,
    ctx: std::sync::Arc<ReconContext>,
) -> Result<()> {
    let shards = ctx.config.service.workers;
    for file in files.iter() {
        if shard_of(&file.name, shards) != shard {
            continue;
        }
        process_file::<A>(file, shard, &ctx).await?;
    }
    Ok(())
}

/// Load one advice file and apply the per-file version decision, holding
/// the key's lock across the whole read-decide-write sequence so that two
/// files carrying the same key are never reconciled concurrently against
/// the same prior version.
pub async fn process_file<A: Activity>(
    file: &AdmittedFile,
    shard: usize,
    ctx: &ReconContext,
) -> Result<()> {
    debug!(shard, kind = A::KIND, file = %file.name, "loading advice file");
    let mut batch = Batch::<A>::load_file(&file.path, &ctx.enrich).await?;

    let Some(key) = batch.key() else {
        info!(shard, kind = A::KIND, file = %file.name, "no records loaded, skipping");
        return Ok(());
    };
    let loaded = batch.len();

    let slot = ctx
        .versions
        .slot(batch_key_hash(&key.batch_name, &key.provider))
        .await;
    let mut last = slot.lock().await;

    match *last {
        None => {
            // First sighting of this key: the full batch is the delta.
            batch.insert_to_store(&ctx.data_db).await?;
            batch.insert_to_store(&ctx.delta_db).await?;
            *last = Some(key.version);
            info!(
                shard,
                kind = A::KIND,
                file = %file.name,
                count = loaded,
                version = key.version,
                "inserted first version of batch"
            );
        }
        Some(prev) if key.version > prev => {
            batch.insert_to_store(&ctx.data_db).await?;
            let stats =
                reconcile_against_last(&mut batch, &key, prev, &ctx.data_db, &ctx.delta_db)
                    .await?;
            // What survived reconciliation is new; it goes out as-is.
            batch.insert_to_store(&ctx.delta_db).await?;
            *last = Some(key.version);
            info!(
                shard,
                kind = A::KIND,
                file = %file.name,
                count = loaded,
                changed = stats.changed,
                removed = stats.removed,
                unchanged = stats.unchanged,
                added = batch.len(),
                from = prev,
                to = key.version,
                "reconciled batch"
            );
        }
        Some(prev) => {
            debug!(
                shard,
                kind = A::KIND,
                file = %file.name,
                version = key.version,
                last = prev,
                "stale or duplicate version, no action"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use dagen_common::hash::shard_of;

    #[test]
    fn every_file_belongs_to_exactly_one_shard() {
        let names = ["a.aac", "b.aac", "c.aac", "d.aac", "e.aac"];
        let shards = 3;
        for name in names {
            let owners: Vec<usize> = (0..shards).filter(|&s| shard_of(name, shards) == s).collect();
            assert_eq!(owners.len(), 1);
        }
    }
}
