//! Domain types and models
//!
//! - [`external`]: read-only views of upstream card transactions and vendor bills
//! - [`ledger`]: the reconciled ledger row and its label enums
//! - [`sync_run`]: audit-log rows and run summaries

pub mod external;
pub mod ledger;
pub mod sync_run;

pub use external::{
    CustomFieldEntry, CustomFieldValue, ExternalRecord, ResolvedFields, SourceKind, SyncState,
};
pub use ledger::{
    FlagCategory, LedgerFilter, LedgerRecord, SyncStatus, TransactionType, UpsertOutcome,
};
pub use sync_run::{
    ReconcileSummary, RecordError, SyncKind, SyncReport, SyncRun, SyncRunOutcome, SyncRunStatus,
};
