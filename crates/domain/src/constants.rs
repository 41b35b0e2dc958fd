//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Ledger identifiers
pub const CARD_ID_PREFIX: &str = "card_";
pub const BILL_ID_PREFIX: &str = "bill_";

// Reconciliation
pub const UNKNOWN_USER: &str = "Unknown User";
pub const AUTO_FLAG_KEYWORD: &str = "reimburse";
pub const BUDGET_BRANCH_MAX_LEN: usize = 32;
pub const DEFAULT_FLAG_LOOKUP_CHUNK: usize = 200;

// Card transaction adapter
pub const CARD_PAGE_SIZE: u32 = 100;
pub const CARD_MAX_PAGES: u32 = 20;
pub const CARD_HISTORICAL_PAGE_SIZE: u32 = 500;
pub const CARD_HISTORICAL_MAX_PAGES: u32 = 200;
pub const CARD_PAGE_DELAY_MS: u64 = 250;

// ERP adapter
pub const ERP_PAGE_SIZE: u32 = 1000;
pub const ERP_MAX_PAGES: u32 = 10;

// Shared HTTP ceilings
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
