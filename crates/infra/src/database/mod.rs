//! Database implementations

pub mod ledger_repository;
pub mod manager;
pub mod sync_run_repository;

pub use ledger_repository::SqliteLedgerStore;
pub use manager::{DbManager, SqliteConnection};
pub use sync_run_repository::SqliteSyncRunLog;
