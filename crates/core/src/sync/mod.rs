//! Sync runs: fetch a work set, reconcile it, and record the run
//!
//! - [`ports`]: work-set sources and the audit log
//! - [`pipeline`]: run lifecycle and failure tiers

pub mod pipeline;
pub mod ports;

pub use pipeline::SyncPipeline;
