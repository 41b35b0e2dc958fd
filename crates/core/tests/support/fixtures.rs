//! Record fixtures

use std::collections::HashMap;
use std::sync::Arc;

use spendledger_core::{CustomFieldIds, ReconcileService, ReferenceData, SyncPipeline, WorkSet};
use spendledger_domain::config::BranchNormalization;
use spendledger_domain::{CustomFieldEntry, ExternalRecord, SourceKind, SyncState};

use super::repositories::{MockLedgerStore, MockSyncRunLog};

pub const BRANCH_FIELD: &str = "cf_branch";
pub const CATEGORY_FIELD: &str = "cf_category";

pub fn references() -> ReferenceData {
    ReferenceData {
        user_names: HashMap::from([
            ("u1".to_string(), "Dana Reyes".to_string()),
            ("u2".to_string(), "Sam Ortiz".to_string()),
        ]),
        field_ids: CustomFieldIds {
            branch: Some(BRANCH_FIELD.to_string()),
            department: Some("cf_department".to_string()),
            category: Some(CATEGORY_FIELD.to_string()),
            memo: None,
        },
    }
}

pub fn card(id: &str, vendor: &str, amount_cents: i64) -> ExternalRecord {
    let mut record =
        ExternalRecord::new(SourceKind::CreditCard, id, "2025-10-01", amount_cents, vendor);
    record.owner_ref = Some("u1".to_string());
    record.status = Some("COMPLETE".to_string());
    record.sync_state = Some(SyncState::NotSynced);
    record
}

pub fn with_branch(mut record: ExternalRecord, branch: &str) -> ExternalRecord {
    record.custom_fields.push(CustomFieldEntry::selected(BRANCH_FIELD, branch));
    record
}

pub fn with_category(mut record: ExternalRecord, category: &str) -> ExternalRecord {
    record.custom_fields.push(CustomFieldEntry::selected(CATEGORY_FIELD, category));
    record
}

pub fn work_set(records: Vec<ExternalRecord>) -> WorkSet {
    WorkSet { records, references: references(), rejected: Vec::new() }
}

/// Pipeline wired to fresh mocks.
pub struct Harness {
    pub store: MockLedgerStore,
    pub run_log: MockSyncRunLog,
    pub pipeline: SyncPipeline,
}

impl Harness {
    pub fn new() -> Self {
        let store = MockLedgerStore::default();
        let run_log = MockSyncRunLog::default();
        let reconciler = Arc::new(
            ReconcileService::new(Arc::new(store.clone()), BranchNormalization::default())
                .with_flag_lookup_chunk(3),
        );
        let pipeline = SyncPipeline::new(reconciler, Arc::new(run_log.clone()));
        Self { store, run_log, pipeline }
    }
}
