//! # Spendledger Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The reconciliation engine (field extraction, flag preservation, upsert
//!   accounting)
//! - The sync pipeline (run lifecycle and failure tiers)
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `spendledger-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod notify_ports;
pub mod reconcile;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use notify_ports::{ChatMessage, ChatNotifier};
pub use reconcile::ports::LedgerStore;
pub use reconcile::{
    merge_preferring_non_null, BranchNormalizer, CustomFieldIds, ReconcileService, ReferenceData,
};
pub use sync::ports::{SyncRunLog, WorkSet, WorkSetSource};
pub use sync::SyncPipeline;
