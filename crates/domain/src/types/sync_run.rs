//! Sync audit-log rows and run summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// Which pipeline a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Card,
    CardHistorical,
    Bills,
}

impl_domain_status_conversions!(SyncKind {
    Card => "card",
    CardHistorical => "card_historical",
    Bills => "bills",
});

/// Lifecycle state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Running,
    Success,
    Partial,
    Failed,
}

impl_domain_status_conversions!(SyncRunStatus {
    Running => "running",
    Success => "success",
    Partial => "partial",
    Failed => "failed",
});

impl SyncRunStatus {
    /// Terminal status as a pure function of counts.
    ///
    /// `failed` when every record errored (or the fetch itself failed and
    /// produced a synthetic error with zero records), `partial` when some did,
    /// `success` otherwise.
    pub fn from_counts(total: usize, errors: usize) -> Self {
        if errors == 0 {
            Self::Success
        } else if errors >= total {
            Self::Failed
        } else {
            Self::Partial
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A record-local or run-fatal failure, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub message: String,
}

impl RecordError {
    pub fn for_record(
        record_id: impl Into<String>,
        vendor: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { record_id: Some(record_id.into()), vendor: Some(vendor.into()), message: message.into() }
    }

    /// Error that is not tied to one record (fetch failures).
    pub fn run_level(message: impl Into<String>) -> Self {
        Self { record_id: None, vendor: None, message: message.into() }
    }
}

/// Counters produced by one pass of the reconciliation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub created: u32,
    pub updated: u32,
    pub flags_preserved: u32,
    pub errors: Vec<RecordError>,
}

/// Final values written to the audit log when a run ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunOutcome {
    pub status: SyncRunStatus,
    pub fetched: u32,
    pub created: u32,
    pub updated: u32,
    pub flags_preserved: u32,
    pub errors: Vec<RecordError>,
}

impl SyncRunOutcome {
    /// Outcome of a run whose fetch stage failed before any record was processed.
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self {
            status: SyncRunStatus::Failed,
            fetched: 0,
            created: 0,
            updated: 0,
            flags_preserved: 0,
            errors: vec![RecordError::run_level(message)],
        }
    }

    /// Outcome derived from a reconciliation summary over `fetched` records.
    pub fn from_summary(fetched: u32, summary: ReconcileSummary) -> Self {
        let status = SyncRunStatus::from_counts(fetched as usize, summary.errors.len());
        Self {
            status,
            fetched,
            created: summary.created,
            updated: summary.updated,
            flags_preserved: summary.flags_preserved,
            errors: summary.errors,
        }
    }
}

/// Stored audit-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: Uuid,
    pub kind: SyncKind,
    pub status: SyncRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub fetched: u32,
    pub created: u32,
    pub updated: u32,
    pub flags_preserved: u32,
    pub errors: Vec<RecordError>,
}

/// JSON summary returned to whoever triggered the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub kind: SyncKind,
    pub status: SyncRunStatus,
    pub fetched: u32,
    pub created: u32,
    pub updated: u32,
    pub flags_preserved: u32,
    pub errors: Vec<RecordError>,
}

impl SyncReport {
    pub fn new(run_id: Uuid, kind: SyncKind, outcome: SyncRunOutcome) -> Self {
        Self {
            run_id,
            kind,
            status: outcome.status,
            fetched: outcome.fetched,
            created: outcome.created,
            updated: outcome.updated,
            flags_preserved: outcome.flags_preserved,
            errors: outcome.errors,
        }
    }
}
