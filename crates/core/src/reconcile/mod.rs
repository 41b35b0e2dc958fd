//! Reconciliation of upstream records into the ledger
//!
//! - [`service`]: the per-record engine (`ReconcileService`)
//! - [`fields`]: custom-field indexing, budget fallback and date parsing
//! - [`branch`]: branch-name normalization
//! - [`flags`]: flag preservation and the auto-flag heuristic
//! - [`merge`]: cross-partition deduplication
//! - [`ports`]: ledger store boundary

pub mod branch;
pub mod fields;
pub mod flags;
pub mod merge;
pub mod ports;
pub mod service;

pub use branch::BranchNormalizer;
pub use fields::{CustomFieldIds, ReferenceData};
pub use flags::{resolve_flag, FlagDecision};
pub use merge::{merge_preferring_non_null, PartitionTagged};
pub use service::ReconcileService;
