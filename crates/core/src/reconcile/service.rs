//! Reconciliation engine - core business logic

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use spendledger_domain::config::BranchNormalization;
use spendledger_domain::constants::{DEFAULT_FLAG_LOOKUP_CHUNK, UNKNOWN_USER};
use spendledger_domain::{
    ExternalRecord, FlagCategory, LedgerRecord, ReconcileSummary, RecordError, Result,
    SourceKind, SyncStatus, UpsertOutcome,
};
use tracing::{debug, info, warn};

use super::branch::BranchNormalizer;
use super::fields::{budget_branch_candidate, parse_transaction_date, ReferenceData};
use super::flags::{resolve_flag, FlagDecision};
use super::ports::LedgerStore;

/// Turns upstream records into ledger rows without touching human flags.
pub struct ReconcileService {
    store: Arc<dyn LedgerStore>,
    branches: BranchNormalizer,
    flag_lookup_chunk: usize,
}

impl ReconcileService {
    pub fn new(store: Arc<dyn LedgerStore>, branches: BranchNormalization) -> Self {
        Self {
            store,
            branches: BranchNormalizer::new(branches),
            flag_lookup_chunk: DEFAULT_FLAG_LOOKUP_CHUNK,
        }
    }

    /// Number of ids per `IN (...)` flag lookup. Zero is treated as one.
    pub fn with_flag_lookup_chunk(mut self, chunk: usize) -> Self {
        self.flag_lookup_chunk = chunk.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Stored flags for the given ledger ids, one batched query per chunk.
    ///
    /// Any failure is returned to the caller; the pipeline treats it as
    /// run-fatal.
    pub async fn load_existing_flags(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, FlagCategory>> {
        let mut flags = HashMap::new();
        for chunk in ids.chunks(self.flag_lookup_chunk) {
            flags.extend(self.store.find_flags(chunk).await?);
        }
        debug!(ids = ids.len(), flagged = flags.len(), "loaded existing flags");
        Ok(flags)
    }

    /// Reconcile a work set, one record at a time.
    ///
    /// Record-local failures are collected in the summary and never stop the
    /// loop.
    pub async fn reconcile(
        &self,
        records: &[ExternalRecord],
        references: &ReferenceData,
        existing_flags: &HashMap<String, FlagCategory>,
    ) -> ReconcileSummary {
        let synced_at = Utc::now();
        let mut summary = ReconcileSummary::default();

        for record in records {
            match self.reconcile_one(record, references, existing_flags, synced_at).await {
                Ok((outcome, decision)) => {
                    match outcome {
                        UpsertOutcome::Inserted => summary.created += 1,
                        UpsertOutcome::Updated => summary.updated += 1,
                    }
                    if decision.is_preserved() {
                        summary.flags_preserved += 1;
                    }
                }
                Err(err) => {
                    let ledger_id = record.ledger_id();
                    warn!(
                        record_id = %ledger_id,
                        vendor = %record.vendor_name,
                        error = %err,
                        "record failed to reconcile"
                    );
                    summary.errors.push(RecordError::for_record(
                        ledger_id,
                        record.vendor_name.clone(),
                        err.to_string(),
                    ));
                }
            }
        }

        info!(
            records = records.len(),
            created = summary.created,
            updated = summary.updated,
            flags_preserved = summary.flags_preserved,
            errors = summary.errors.len(),
            "reconciliation pass complete"
        );
        summary
    }

    /// Build the ledger row for one record.
    ///
    /// Pure apart from the clock value passed in; exposed for callers that
    /// want to preview a row without writing it. A row whose flag is preserved
    /// carries no flag; the store keeps its own.
    pub fn build_record(
        &self,
        record: &ExternalRecord,
        references: &ReferenceData,
        existing_flag: Option<FlagCategory>,
        synced_at: DateTime<Utc>,
    ) -> Result<(LedgerRecord, FlagDecision)> {
        let transaction_date = parse_transaction_date(&record.occurred_on)?;

        let mut fields = references
            .field_ids
            .extract(&record.custom_fields)
            .or(record.prefilled.clone());
        if fields.branch.is_none() {
            fields.branch = budget_branch_candidate(record.budget_id.as_deref());
        }
        let branch = fields.branch.as_deref().map(|raw| self.branches.normalize(raw));

        let decision = resolve_flag(existing_flag, fields.category.as_deref());

        let ledger = LedgerRecord {
            id: record.ledger_id(),
            transaction_date,
            vendor_name: record.vendor_name.clone(),
            amount_cents: record.amount_cents,
            currency: record.currency.clone(),
            memo: fields.memo.or_else(|| record.memo.clone()),
            branch,
            department: fields.department,
            category: fields.category,
            cardholder: cardholder_name(record, references),
            status: record.status.clone(),
            transaction_type: record.source.transaction_type(),
            sync_status: sync_status(record),
            flag_category: decision.write_value(),
            last_synced_at: synced_at,
        };

        Ok((ledger, decision))
    }

    async fn reconcile_one(
        &self,
        record: &ExternalRecord,
        references: &ReferenceData,
        existing_flags: &HashMap<String, FlagCategory>,
        synced_at: DateTime<Utc>,
    ) -> Result<(UpsertOutcome, FlagDecision)> {
        let existing = existing_flags.get(&record.ledger_id()).copied();
        let (ledger, decision) = self.build_record(record, references, existing, synced_at)?;
        let outcome = self.store.upsert(&ledger).await?;
        Ok((outcome, decision))
    }
}

fn cardholder_name(record: &ExternalRecord, references: &ReferenceData) -> Option<String> {
    if let Some(name) = record.owner_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }

    let resolved = record
        .owner_ref
        .as_deref()
        .and_then(|owner| references.user_names.get(owner))
        .cloned();

    match record.source {
        SourceKind::CreditCard => Some(resolved.unwrap_or_else(|| UNKNOWN_USER.to_string())),
        SourceKind::VendorBill => resolved,
    }
}

fn sync_status(record: &ExternalRecord) -> Option<SyncStatus> {
    match record.source {
        SourceKind::CreditCard => Some(
            record
                .sync_state
                .or(record.integration_status)
                .map_or(SyncStatus::NotSynced, SyncStatus::from),
        ),
        SourceKind::VendorBill => None,
    }
}
