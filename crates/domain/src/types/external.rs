//! Read-only views of upstream records
//!
//! Source adapters normalize card transactions and vendor bills into
//! [`ExternalRecord`]s; the reconciliation engine turns those into ledger rows.

use serde::{Deserialize, Serialize};

use super::ledger::TransactionType;
use crate::constants::{BILL_ID_PREFIX, CARD_ID_PREFIX};

/// Upstream system a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CreditCard,
    VendorBill,
}

impl SourceKind {
    /// Ledger primary key for a source-native id.
    ///
    /// The prefix keeps a card id and a bill id that share the same raw value
    /// from colliding.
    pub fn ledger_id(&self, source_id: &str) -> String {
        match self {
            Self::CreditCard => format!("{CARD_ID_PREFIX}{source_id}"),
            Self::VendorBill => format!("{BILL_ID_PREFIX}{source_id}"),
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::CreditCard => TransactionType::CreditCard,
            Self::VendorBill => TransactionType::VendorBill,
        }
    }
}

/// Accounting-sync state reported by the card platform.
///
/// The four states partition the transaction space; a full fetch queries each
/// partition once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Synced,
    ManualSynced,
    NotSynced,
    Error,
}

impl SyncState {
    /// Every partition, in query order.
    pub const ALL: [SyncState; 4] =
        [SyncState::Synced, SyncState::ManualSynced, SyncState::NotSynced, SyncState::Error];

    /// Value used in the upstream `syncStatus:eq:<value>` filter.
    pub fn as_filter_value(&self) -> &'static str {
        match self {
            Self::Synced => "SYNCED",
            Self::ManualSynced => "MANUAL_SYNCED",
            Self::NotSynced => "NOT_SYNCED",
            Self::Error => "ERROR",
        }
    }

    /// Parse an upstream value; unknown values yield `None`.
    pub fn from_upstream(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SYNCED" => Some(Self::Synced),
            "MANUAL_SYNCED" => Some(Self::ManualSynced),
            "NOT_SYNCED" => Some(Self::NotSynced),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Value held by one custom/extension field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum CustomFieldValue {
    Text(String),
    Selected(String),
}

impl CustomFieldValue {
    /// Non-empty textual content, trimmed.
    pub fn as_text(&self) -> Option<&str> {
        let raw = match self {
            Self::Text(value) | Self::Selected(value) => value.trim(),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

/// A custom field value keyed by the upstream field identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldEntry {
    pub field_id: String,
    pub value: CustomFieldValue,
}

impl CustomFieldEntry {
    pub fn text(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field_id: field_id.into(), value: CustomFieldValue::Text(value.into()) }
    }

    pub fn selected(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self { field_id: field_id.into(), value: CustomFieldValue::Selected(value.into()) }
    }
}

/// Fixed-shape business fields extracted from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFields {
    pub branch: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub memo: Option<String>,
}

impl ResolvedFields {
    /// Fill every empty slot from `other`, keeping values already present.
    pub fn or(self, other: ResolvedFields) -> ResolvedFields {
        ResolvedFields {
            branch: self.branch.or(other.branch),
            department: self.department.or(other.department),
            category: self.category.or(other.category),
            memo: self.memo.or(other.memo),
        }
    }
}

/// A transaction or bill as returned by an upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub source: SourceKind,
    pub source_id: String,
    /// Occurrence date as sent upstream; parsed during reconciliation.
    pub occurred_on: String,
    pub amount_cents: i64,
    pub currency: String,
    pub vendor_name: String,
    /// Owning-user reference (card user id).
    pub owner_ref: Option<String>,
    /// Owner display name when the upstream payload already carries it.
    pub owner_name: Option<String>,
    pub memo: Option<String>,
    /// Account-level budget identifier (card records).
    pub budget_id: Option<String>,
    pub custom_fields: Vec<CustomFieldEntry>,
    /// Fields the adapter read from structured sub-resources.
    pub prefilled: ResolvedFields,
    /// Completion or approval status string.
    pub status: Option<String>,
    /// State embedded in the record's integration-status sub-object.
    pub integration_status: Option<SyncState>,
    /// Partition the record was fetched from, when known.
    pub sync_state: Option<SyncState>,
}

impl ExternalRecord {
    /// Minimal record for the given source; adapters fill in the rest.
    pub fn new(
        source: SourceKind,
        source_id: impl Into<String>,
        occurred_on: impl Into<String>,
        amount_cents: i64,
        vendor_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            occurred_on: occurred_on.into(),
            amount_cents,
            currency: "USD".to_string(),
            vendor_name: vendor_name.into(),
            owner_ref: None,
            owner_name: None,
            memo: None,
            budget_id: None,
            custom_fields: Vec::new(),
            prefilled: ResolvedFields::default(),
            status: None,
            integration_status: None,
            sync_state: None,
        }
    }

    pub fn ledger_id(&self) -> String {
        self.source.ledger_id(&self.source_id)
    }
}
