//! Mock port implementations for testing
//!
//! Provides in-memory mocks for the ledger store, the sync audit log and a
//! work-set source, enabling deterministic tests without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use spendledger_core::{LedgerStore, SyncRunLog, WorkSet, WorkSetSource};
use spendledger_domain::{
    FlagCategory, LedgerError, LedgerFilter, LedgerRecord, Result as DomainResult, SyncKind,
    SyncRun, SyncRunOutcome, SyncRunStatus, UpsertOutcome,
};
use uuid::Uuid;

/// In-memory mock for `LedgerStore`.
///
/// Mirrors the SQL upsert: a stored flag is kept over an incoming one.
#[derive(Default, Clone)]
pub struct MockLedgerStore {
    rows: Arc<Mutex<HashMap<String, LedgerRecord>>>,
    failing_ids: Arc<Mutex<HashSet<String>>>,
    fail_lookups: Arc<Mutex<bool>>,
    upserts: Arc<Mutex<usize>>,
}

impl MockLedgerStore {
    /// Make every upsert of `id` fail with a database error.
    pub fn fail_upsert_for(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_flag_lookups(&self) {
        *self.fail_lookups.lock().unwrap() = true;
    }

    pub fn row(&self, id: &str) -> Option<LedgerRecord> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn upsert_calls(&self) -> usize {
        *self.upserts.lock().unwrap()
    }

    /// Rows sorted by id.
    pub fn snapshot(&self) -> Vec<LedgerRecord> {
        let mut rows: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}

#[async_trait]
impl LedgerStore for MockLedgerStore {
    async fn find_flags(&self, ids: &[String]) -> DomainResult<HashMap<String, FlagCategory>> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(LedgerError::Database("flag lookup unavailable".into()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).and_then(|r| r.flag_category).map(|f| (id.clone(), f)))
            .collect())
    }

    async fn upsert(&self, record: &LedgerRecord) -> DomainResult<UpsertOutcome> {
        *self.upserts.lock().unwrap() += 1;
        if self.failing_ids.lock().unwrap().contains(&record.id) {
            return Err(LedgerError::Database(format!("write failed for {}", record.id)));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut incoming = record.clone();
        match rows.get(&record.id) {
            Some(existing) => {
                incoming.flag_category = existing.flag_category.or(incoming.flag_category);
                rows.insert(record.id.clone(), incoming);
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.insert(record.id.clone(), incoming);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, id: &str) -> DomainResult<Option<LedgerRecord>> {
        Ok(self.row(id))
    }

    async fn list(&self, filter: &LedgerFilter) -> DomainResult<Vec<LedgerRecord>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|r| filter.flag.map_or(true, |f| r.flag_category == Some(f)))
            .collect())
    }

    async fn set_flag(&self, id: &str, flag: Option<FlagCategory>) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(id).ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        row.flag_category = flag;
        Ok(())
    }
}

/// In-memory mock for `SyncRunLog`.
#[derive(Default, Clone)]
pub struct MockSyncRunLog {
    runs: Arc<Mutex<Vec<SyncRun>>>,
}

impl MockSyncRunLog {
    pub fn runs(&self) -> Vec<SyncRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn last(&self) -> SyncRun {
        self.runs().last().cloned().expect("no sync runs recorded")
    }
}

#[async_trait]
impl SyncRunLog for MockSyncRunLog {
    async fn start(&self, kind: SyncKind) -> DomainResult<Uuid> {
        let run = SyncRun {
            id: Uuid::now_v7(),
            kind,
            status: SyncRunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            fetched: 0,
            created: 0,
            updated: 0,
            flags_preserved: 0,
            errors: Vec::new(),
        };
        let id = run.id;
        self.runs.lock().unwrap().push(run);
        Ok(id)
    }

    async fn finish(&self, run_id: Uuid, outcome: &SyncRunOutcome) -> DomainResult<()> {
        let mut runs = self.runs.lock().unwrap();
        let run = runs
            .iter_mut()
            .find(|r| r.id == run_id && r.status == SyncRunStatus::Running)
            .ok_or_else(|| LedgerError::InvalidInput(format!("run {run_id} is not running")))?;

        run.status = outcome.status;
        run.finished_at = Some(Utc::now());
        run.fetched = outcome.fetched;
        run.created = outcome.created;
        run.updated = outcome.updated;
        run.flags_preserved = outcome.flags_preserved;
        run.errors = outcome.errors.clone();
        Ok(())
    }

    async fn recent(&self, limit: u32) -> DomainResult<Vec<SyncRun>> {
        Ok(self.runs().into_iter().rev().take(limit as usize).collect())
    }
}

/// Work-set source returning a fixed work set, or a fixed error.
pub struct StaticSource {
    kind: SyncKind,
    result: DomainResult<WorkSet>,
}

impl StaticSource {
    pub fn new(kind: SyncKind, work_set: WorkSet) -> Self {
        Self { kind, result: Ok(work_set) }
    }

    pub fn failing(kind: SyncKind, error: LedgerError) -> Self {
        Self { kind, result: Err(error) }
    }
}

#[async_trait]
impl WorkSetSource for StaticSource {
    fn kind(&self) -> SyncKind {
        self.kind
    }

    async fn fetch_work_set(&self) -> DomainResult<WorkSet> {
        self.result.clone()
    }
}
