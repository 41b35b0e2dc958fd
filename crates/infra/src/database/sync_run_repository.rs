//! SQLite implementation of the sync audit log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use spendledger_core::SyncRunLog;
use spendledger_domain::{
    LedgerError, RecordError, Result as DomainResult, SyncKind, SyncRun, SyncRunOutcome,
    SyncRunStatus,
};
use tokio::task;
use uuid::Uuid;

use super::ledger_repository::{format_timestamp, parse_column, parse_timestamp_column};
use super::manager::{map_join_error, map_sql_error, DbManager};

/// Audit-log rows in the `sync_runs` table.
pub struct SqliteSyncRunLog {
    db: Arc<DbManager>,
}

impl SqliteSyncRunLog {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn finish_run(
        conn: &rusqlite::Connection,
        run_id: Uuid,
        outcome: &SyncRunOutcome,
    ) -> DomainResult<()> {
        if !outcome.status.is_terminal() {
            return Err(LedgerError::InvalidInput("a run cannot finish as running".into()));
        }

        let errors = serde_json::to_string(&outcome.errors)
            .map_err(|err| LedgerError::Internal(format!("failed to serialize run errors: {err}")))?;

        let changed = conn
            .execute(
                "UPDATE sync_runs
                 SET status = ?1, finished_at = ?2, fetched = ?3, created = ?4, updated = ?5,
                     flags_preserved = ?6, errors = ?7
                 WHERE id = ?8 AND status = 'running'",
                params![
                    outcome.status.as_str(),
                    format_timestamp(Utc::now()),
                    outcome.fetched,
                    outcome.created,
                    outcome.updated,
                    outcome.flags_preserved,
                    errors,
                    run_id.to_string(),
                ],
            )
            .map_err(map_sql_error)?;

        if changed == 1 {
            return Ok(());
        }

        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM sync_runs WHERE id = ?1",
                params![run_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;

        match status {
            Some(status) => {
                Err(LedgerError::InvalidInput(format!("sync run {run_id} already finished ({status})")))
            }
            None => Err(LedgerError::NotFound(format!("sync run {run_id}"))),
        }
    }
}

#[async_trait]
impl SyncRunLog for SqliteSyncRunLog {
    async fn start(&self, kind: SyncKind) -> DomainResult<Uuid> {
        let db = Arc::clone(&self.db);
        let run_id = Uuid::now_v7();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO sync_runs (id, kind, status, started_at) VALUES (?1, ?2, 'running', ?3)",
                params![run_id.to_string(), kind.as_str(), format_timestamp(Utc::now())],
            )
            .map_err(map_sql_error)?;
            Ok(run_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn finish(&self, run_id: Uuid, outcome: &SyncRunOutcome) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let outcome = outcome.clone();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            Self::finish_run(&conn, run_id, &outcome)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn recent(&self, limit: u32) -> DomainResult<Vec<SyncRun>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, kind, status, started_at, finished_at, fetched, created, updated,
                            flags_preserved, errors
                     FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT ?1",
                )
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![limit.max(1)], map_sync_run_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_sync_run_row(row: &Row<'_>) -> rusqlite::Result<SyncRun> {
    let id: String = row.get(0)?;
    let finished_at: Option<String> = row.get(4)?;
    let errors: String = row.get(9)?;

    Ok(SyncRun {
        id: Uuid::parse_str(&id).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
        })?,
        kind: parse_column::<SyncKind>(1, row.get(1)?)?,
        status: parse_column::<SyncRunStatus>(2, row.get(2)?)?,
        started_at: parse_timestamp_column(3, &row.get::<_, String>(3)?)?,
        finished_at: finished_at.map(|raw| parse_timestamp_column(4, &raw)).transpose()?,
        fetched: row.get(5)?,
        created: row.get(6)?,
        updated: row.get(7)?,
        flags_preserved: row.get(8)?,
        errors: serde_json::from_str::<Vec<RecordError>>(&errors).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(err))
        })?,
    })
}
