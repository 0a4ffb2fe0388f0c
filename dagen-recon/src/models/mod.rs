//! Data models: the two activity kinds and the reference transactions

pub mod account;
pub mod activity;
pub mod submission;
pub mod transaction;

pub use account::AccountActivity;
pub use activity::{Activity, BatchKeyVersion};
pub use submission::SubmissionActivity;
pub use transaction::{TransactionRecord, TxAttributes};
