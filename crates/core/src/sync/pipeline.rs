//! Sync pipeline
//!
//! One run: start the audit row, fetch, look up stored flags, reconcile,
//! finish the audit row. Fetch and flag-lookup failures are run-fatal and
//! leave the ledger untouched; record failures are collected by the engine.

use std::sync::Arc;

use spendledger_domain::{Result, SyncReport, SyncRunOutcome};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::ports::{SyncRunLog, WorkSet, WorkSetSource};
use crate::reconcile::ReconcileService;

/// Drives reconciliation runs against a ledger store and audit log.
pub struct SyncPipeline {
    reconciler: Arc<ReconcileService>,
    run_log: Arc<dyn SyncRunLog>,
}

impl SyncPipeline {
    pub fn new(reconciler: Arc<ReconcileService>, run_log: Arc<dyn SyncRunLog>) -> Self {
        Self { reconciler, run_log }
    }

    pub fn reconciler(&self) -> &Arc<ReconcileService> {
        &self.reconciler
    }

    pub fn run_log(&self) -> &Arc<dyn SyncRunLog> {
        &self.run_log
    }

    /// Execute one run from `source`.
    ///
    /// Only a failure to create the audit row is returned as `Err`; every
    /// other failure is reported through the returned [`SyncReport`].
    #[instrument(skip(self, source), fields(kind = %source.kind()))]
    pub async fn run(&self, source: &dyn WorkSetSource) -> Result<SyncReport> {
        let kind = source.kind();
        let run_id = self.run_log.start(kind).await?;
        info!(%run_id, "sync run started");

        let outcome = match source.fetch_work_set().await {
            Ok(work_set) => self.process(work_set).await,
            Err(err) => {
                error!(%run_id, error = %err, "fetch failed; run aborted");
                SyncRunOutcome::fetch_failed(err.to_string())
            }
        };

        self.finish(run_id, &outcome).await;

        info!(
            %run_id,
            status = %outcome.status,
            fetched = outcome.fetched,
            created = outcome.created,
            updated = outcome.updated,
            flags_preserved = outcome.flags_preserved,
            errors = outcome.errors.len(),
            "sync run finished"
        );
        Ok(SyncReport::new(run_id, kind, outcome))
    }

    async fn process(&self, work_set: WorkSet) -> SyncRunOutcome {
        let WorkSet { records, references, rejected } = work_set;
        let fetched = u32::try_from(records.len() + rejected.len()).unwrap_or(u32::MAX);
        let ids: Vec<String> = records.iter().map(|r| r.ledger_id()).collect();

        if !rejected.is_empty() {
            warn!(fetched, rejected = rejected.len(), "upstream items rejected before reconcile");
        }

        let existing_flags = match self.reconciler.load_existing_flags(&ids).await {
            Ok(flags) => flags,
            Err(err) => {
                error!(fetched, error = %err, "flag lookup failed; run aborted");
                return SyncRunOutcome::fetch_failed(format!("flag lookup failed: {err}"));
            }
        };

        let mut summary = self.reconciler.reconcile(&records, &references, &existing_flags).await;
        let mut errors = rejected;
        errors.append(&mut summary.errors);
        summary.errors = errors;
        SyncRunOutcome::from_summary(fetched, summary)
    }

    async fn finish(&self, run_id: Uuid, outcome: &SyncRunOutcome) {
        if let Err(err) = self.run_log.finish(run_id, outcome).await {
            warn!(%run_id, error = %err, "failed to record sync run outcome");
        }
    }
}
