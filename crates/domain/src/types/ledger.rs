//! Reconciled ledger rows

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::external::SyncState;
use crate::impl_domain_status_conversions;

/// Human-assigned triage label.
///
/// Reconciliation may set [`FlagCategory::NeedsReview`] on a row that has no
/// flag; it never replaces a flag that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagCategory {
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Good to Sync")]
    GoodToSync,
    #[serde(rename = "Missing Info")]
    MissingInfo,
    #[serde(rename = "Personal")]
    Personal,
}

impl_domain_status_conversions!(FlagCategory {
    NeedsReview => "Needs Review",
    GoodToSync => "Good to Sync",
    MissingInfo => "Missing Info",
    Personal => "Personal",
});

/// Origin of a ledger row as shown to reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Vendor Bill")]
    VendorBill,
}

impl_domain_status_conversions!(TransactionType {
    CreditCard => "Credit Card",
    VendorBill => "Vendor Bill",
});

/// Ledger mirror of the upstream accounting-sync state (card rows only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    #[serde(rename = "Synced")]
    Synced,
    #[serde(rename = "Manual Synced")]
    ManualSynced,
    #[serde(rename = "Not Synced")]
    NotSynced,
    #[serde(rename = "Error")]
    Error,
}

impl_domain_status_conversions!(SyncStatus {
    Synced => "Synced",
    ManualSynced => "Manual Synced",
    NotSynced => "Not Synced",
    Error => "Error",
});

impl From<SyncState> for SyncStatus {
    fn from(state: SyncState) -> Self {
        match state {
            SyncState::Synced => Self::Synced,
            SyncState::ManualSynced => Self::ManualSynced,
            SyncState::NotSynced => Self::NotSynced,
            SyncState::Error => Self::Error,
        }
    }
}

/// One reconciled expense row, keyed by its namespaced identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub id: String,
    pub transaction_date: NaiveDate,
    pub vendor_name: String,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    pub currency: String,
    pub memo: Option<String>,
    pub branch: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub cardholder: Option<String>,
    pub status: Option<String>,
    pub transaction_type: TransactionType,
    pub sync_status: Option<SyncStatus>,
    pub flag_category: Option<FlagCategory>,
    pub last_synced_at: DateTime<Utc>,
}

/// Whether an upsert created the row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Filter for ordinary ledger selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFilter {
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub flag: Option<FlagCategory>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<u32>,
}
