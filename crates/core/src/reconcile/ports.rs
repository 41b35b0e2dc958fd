//! Port interfaces for the ledger store
//!
//! The store is a relational table keyed by the namespaced ledger id. The
//! reconciliation engine only needs the batched flag lookup and the upsert;
//! the remaining methods back reviewer actions.

use std::collections::HashMap;

use async_trait::async_trait;
use spendledger_domain::{FlagCategory, LedgerFilter, LedgerRecord, Result, UpsertOutcome};

/// Trait for persisting reconciled ledger rows
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stored non-null flags for the given ids, in one `IN (...)` query.
    ///
    /// Ids without a row or without a flag are absent from the map.
    async fn find_flags(&self, ids: &[String]) -> Result<HashMap<String, FlagCategory>>;

    /// Insert or update a row keyed by `record.id`.
    ///
    /// Implementations must keep an already stored non-null flag even when
    /// `record.flag_category` differs, and report whether the row was inserted
    /// from the same statement that wrote it.
    async fn upsert(&self, record: &LedgerRecord) -> Result<UpsertOutcome>;

    /// Fetch a single row
    async fn get(&self, id: &str) -> Result<Option<LedgerRecord>>;

    /// Ordinary filtered select, newest transactions first
    async fn list(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>>;

    /// Reviewer edit of the flag; `None` clears it
    async fn set_flag(&self, id: &str, flag: Option<FlagCategory>) -> Result<()>;
}
