//! Port interfaces for sync operations

use async_trait::async_trait;
use spendledger_domain::{ExternalRecord, RecordError, Result, SyncKind, SyncRun, SyncRunOutcome};
use uuid::Uuid;

use crate::reconcile::ReferenceData;

/// Everything one run needs from upstream: the records and the per-run lookup
/// tables used to interpret them.
///
/// `rejected` holds upstream items the adapter could not turn into a record.
/// They count as fetched and surface as record errors on the run.
#[derive(Debug, Clone, Default)]
pub struct WorkSet {
    pub records: Vec<ExternalRecord>,
    pub references: ReferenceData,
    pub rejected: Vec<RecordError>,
}

/// Trait for an upstream adapter that produces a complete work set
///
/// Any error returned from `fetch_work_set` aborts the run before a single
/// ledger write.
#[async_trait]
pub trait WorkSetSource: Send + Sync {
    /// Kind recorded on the audit-log row
    fn kind(&self) -> SyncKind;

    /// Fetch records and reference data for one run
    async fn fetch_work_set(&self) -> Result<WorkSet>;
}

/// Trait for the sync audit log
#[async_trait]
pub trait SyncRunLog: Send + Sync {
    /// Insert a `running` row and return its id
    async fn start(&self, kind: SyncKind) -> Result<Uuid>;

    /// Write the terminal values; rejects a run that is no longer `running`
    async fn finish(&self, run_id: Uuid, outcome: &SyncRunOutcome) -> Result<()>;

    /// Most recent runs, newest first
    async fn recent(&self, limit: u32) -> Result<Vec<SyncRun>>;
}
