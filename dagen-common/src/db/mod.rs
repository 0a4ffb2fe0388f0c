//! Store initialization and schemas

pub mod init;
pub mod schema;

pub use init::*;
