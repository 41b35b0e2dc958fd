//! # Spendledger Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite ledger store and sync audit log (r2d2 pool)
//! - HTTP client with retry and timeout support
//! - Upstream integrations (card platform, ERP, chat webhook)
//! - Configuration loading
//! - Cron scheduling of reconciliation runs
//!
//! ## Architecture
//! - Implements traits defined in `spendledger-core`
//! - Contains all "impure" code (I/O, network, clocks)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::*;
pub use errors::*;
pub use http::*;
pub use integrations::*;
