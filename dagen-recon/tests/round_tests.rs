//! Full round tests
//!
//! Exercises the round controller end to end: transaction ingest, pairing,
//! sharded dispatch of both record kinds, enrichment, delta output and
//! file consumption.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use dagen_common::config::ServiceConfig;
use dagen_common::db::sqlite_url;
use dagen_common::hash::batch_key_hash;
use dagen_recon::models::{Activity, SubmissionActivity};
use dagen_recon::services::RoundController;
use dagen_recon::ReconContext;

fn config_for(root: &Path) -> ServiceConfig {
    let toml = format!(
        r#"
[io]
advice_dir = "{advice}"
transaction_dir = "{tx}"

[database]
data_url = "{data}"
delta_url = "{delta}"

[service]
workers = 3
tx_chunk_size = 1
"#,
        advice = root.join("advice").display(),
        tx = root.join("tx").display(),
        data = sqlite_url(&root.join("data.db")),
        delta = sqlite_url(&root.join("delta.db")),
    );
    let path = root.join("service.toml");
    std::fs::write(&path, toml).unwrap();
    ServiceConfig::load(&path).unwrap()
}

async fn context(root: &Path) -> Arc<ReconContext> {
    std::fs::create_dir_all(root.join("advice")).unwrap();
    std::fs::create_dir_all(root.join("tx")).unwrap();
    Arc::new(ReconContext::init(config_for(root)).await.unwrap())
}

fn account_line(merchant: &str, amount: f64) -> String {
    format!(
        r#"{{"AdviceFileName":"acct-0301","AdviceProvider":"acq1","Version":1,"AccountActivityType":"Fee","DownloadedTime":"2026-03-01T04:00:00Z","TimeStamp":"2026-03-01T03:00:00Z","MerchantId":"{merchant}","Currency":"USD","Amount":{amount}}}"#
    )
}

fn submission_line(mrn: &str, amount: f64) -> String {
    format!(
        r#"{{"AdviceFileName":"sub-0301","AdviceProvider":"acq1","Version":1,"TransactionType":"Sale","DownloadedTime":"2026-03-01T04:00:00Z","TimeStamp":"2026-03-01T03:30:00Z","MerchantId":"M9","Currency":"USD","Amount":{amount},"MerchantReferenceNumber":"{mrn}"}}"#
    )
}

#[tokio::test]
async fn round_processes_pairs_and_consumes_files() {
    let dir = TempDir::new().unwrap();
    let ctx = context(dir.path()).await;
    let advice = dir.path().join("advice");
    let tx = dir.path().join("tx");

    // Reference transactions: MRN-1 maps onto a Sale with seller/partner.
    std::fs::write(
        tx.join("tx.csv"),
        "MRN-1,1,INT-1,Acme Ltd,P42,2026-02-28\nMRN-2,2,,Other Co,P43,2026-02-28\n",
    )
    .unwrap();

    // One complete pair plus one orphan of each kind.
    std::fs::write(
        advice.join("drop-0301.aac"),
        format!("{}\n{}\n", account_line("M1", 10.0), account_line("M2", 5.0)),
    )
    .unwrap();
    std::fs::write(
        advice.join("drop-0301.sac"),
        format!("{}\n{}\n", submission_line("MRN-1", 100.0), submission_line("MRN-9", 50.0)),
    )
    .unwrap();
    std::fs::write(advice.join("orphan.aac"), account_line("M3", 1.0)).unwrap();
    std::fs::write(advice.join("widow.sac"), submission_line("MRN-1", 1.0)).unwrap();

    let controller = RoundController::new(ctx.clone());
    let summary = controller.run_round().await.unwrap();
    assert_eq!(summary.account_files, 1);
    assert_eq!(summary.submission_files, 1);
    assert_eq!(summary.transactions, 2);

    // Admitted files are gone, orphans and the consumed CSV's absence hold.
    assert!(!advice.join("drop-0301.aac").exists());
    assert!(!advice.join("drop-0301.sac").exists());
    assert!(advice.join("orphan.aac").exists());
    assert!(advice.join("widow.sac").exists());
    assert!(!tx.join("tx.csv").exists());

    // Both kinds landed in the data store and the delta store verbatim.
    assert_eq!(
        dagen_recon::models::AccountActivity::count(&ctx.data_db, "acct-0301", "acq1")
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        SubmissionActivity::count(&ctx.data_db, "sub-0301", "acq1").await.unwrap(),
        2
    );
    let delta_subs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submission_activity")
        .fetch_one(&ctx.delta_db)
        .await
        .unwrap();
    assert_eq!(delta_subs, 2);

    // MRN-1 was enriched from the ingested transactions; MRN-9 had no
    // reference and keeps empty attributes.
    let rows = SubmissionActivity::fetch_version(&ctx.data_db, "sub-0301", "acq1", 1)
        .await
        .unwrap();
    let enriched = rows.iter().find(|r| r.merchant_reference_number == "MRN-1").unwrap();
    assert_eq!(enriched.internal_mrn, "INT-1");
    assert_eq!(enriched.seller_of_record, "Acme Ltd");
    assert_eq!(enriched.partner, "P42");
    let bare = rows.iter().find(|r| r.merchant_reference_number == "MRN-9").unwrap();
    assert!(bare.internal_mrn.is_empty());
    assert!(bare.seller_of_record.is_empty());
    assert!(bare.partner.is_empty());

    // Both keys are confirmed at version 1.
    assert_eq!(ctx.versions.current(batch_key_hash("acct-0301", "acq1")).await, Some(1));
    assert_eq!(ctx.versions.current(batch_key_hash("sub-0301", "acq1")).await, Some(1));
}

#[tokio::test]
async fn idle_round_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let ctx = context(dir.path()).await;

    let summary = RoundController::new(ctx).run_round().await.unwrap();
    assert_eq!(summary.account_files, 0);
    assert_eq!(summary.submission_files, 0);
    assert_eq!(summary.transactions, 0);
}

#[tokio::test]
async fn enrichment_keeps_hashes_stable_across_versions() {
    let dir = TempDir::new().unwrap();
    let ctx = context(dir.path()).await;
    let advice = dir.path().join("advice");
    let tx = dir.path().join("tx");

    std::fs::write(tx.join("tx.csv"), "MRN-1,1,INT-1,Acme Ltd,P42,2026-02-28\n").unwrap();
    std::fs::write(advice.join("d1.aac"), account_line("M1", 1.0)).unwrap();
    std::fs::write(advice.join("d1.sac"), submission_line("MRN-1", 100.0)).unwrap();

    let controller = RoundController::new(ctx.clone());
    controller.run_round().await.unwrap();

    // Second round redelivers the same submission at version 2 with the
    // same amount. Enrichment must resolve identically (now through the
    // cache), the records must match by semantic hash, and the unchanged
    // amount must produce no new delta row.
    let v2 = submission_line("MRN-1", 100.0).replace(r#""Version":1"#, r#""Version":2"#);
    std::fs::write(advice.join("d2.aac"), account_line("M1", 1.0).replace(r#""Version":1"#, r#""Version":2"#)).unwrap();
    std::fs::write(advice.join("d2.sac"), v2).unwrap();
    controller.run_round().await.unwrap();

    let delta_v2: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM submission_activity WHERE version = 2",
    )
    .fetch_one(&ctx.delta_db)
    .await
    .unwrap();
    assert_eq!(delta_v2, 0);
    let negated: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM submission_activity WHERE amount < 0",
    )
    .fetch_one(&ctx.delta_db)
    .await
    .unwrap();
    assert_eq!(negated, 0);
    assert_eq!(ctx.versions.current(batch_key_hash("sub-0301", "acq1")).await, Some(2));
}
