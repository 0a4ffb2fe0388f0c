//! Service layer: pairing, sharded dispatch, reconciliation, ingest and
//! the round loop

pub mod dispatch;
pub mod pairing;
pub mod reconcile;
pub mod rounds;
pub mod tx_ingest;

pub use dispatch::{process_file, run_shard};
pub use pairing::{pair_directory, AdmittedFile};
pub use reconcile::{reconcile_against_last, ReconcileStats};
pub use rounds::{RoundController, RoundSummary};
pub use tx_ingest::ingest_transaction_files;
