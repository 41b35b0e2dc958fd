//! SQLite implementation of the ledger store port.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use spendledger_core::LedgerStore;
use spendledger_domain::{
    FlagCategory, LedgerError, LedgerFilter, LedgerRecord, Result as DomainResult, UpsertOutcome,
};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::manager::{map_join_error, map_sql_error, DbManager};

const DEFAULT_LIST_LIMIT: u32 = 500;
const MAX_LIST_LIMIT: u32 = 5_000;

/// Ledger rows in the `ledger_records` table.
pub struct SqliteLedgerStore {
    db: Arc<DbManager>,
}

impl SqliteLedgerStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn upsert_row(conn: &rusqlite::Connection, record: &LedgerRecord) -> DomainResult<UpsertOutcome> {
        let nonce = Uuid::new_v4().to_string();
        let synced_at = format_timestamp(record.last_synced_at);

        let stored_nonce: String = conn
            .query_row(
                LEDGER_UPSERT_SQL,
                params![
                    record.id,
                    format_date(record.transaction_date),
                    record.vendor_name,
                    record.amount_cents,
                    record.currency,
                    record.memo,
                    record.branch,
                    record.department,
                    record.category,
                    record.cardholder,
                    record.status,
                    record.transaction_type.as_str(),
                    record.sync_status.map(|s| s.as_str()),
                    record.flag_category.map(|f| f.as_str()),
                    synced_at,
                    nonce,
                ],
                |row| row.get(0),
            )
            .map_err(map_sql_error)?;

        Ok(if stored_nonce == nonce { UpsertOutcome::Inserted } else { UpsertOutcome::Updated })
    }

    fn select_flags(
        conn: &rusqlite::Connection,
        ids: &[String],
    ) -> DomainResult<HashMap<String, FlagCategory>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, flag_category FROM ledger_records
             WHERE flag_category IS NOT NULL AND id IN ({placeholders})"
        );

        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                let id: String = row.get(0)?;
                let flag: FlagCategory = parse_column(1, row.get(1)?)?;
                Ok((id, flag))
            })
            .map_err(map_sql_error)?;

        rows.collect::<rusqlite::Result<HashMap<_, _>>>().map_err(map_sql_error)
    }

    fn select_filtered(
        conn: &rusqlite::Connection,
        filter: &LedgerFilter,
    ) -> DomainResult<Vec<LedgerRecord>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(kind) = filter.transaction_type {
            clauses.push("transaction_type = ?");
            values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(flag) = filter.flag {
            clauses.push("flag_category = ?");
            values.push(Value::Text(flag.as_str().to_string()));
        }
        if let Some(from) = filter.from {
            clauses.push("transaction_date >= ?");
            values.push(Value::Text(format_date(from)));
        }
        if let Some(to) = filter.to {
            clauses.push("transaction_date <= ?");
            values.push(Value::Text(format_date(to)));
        }

        let where_clause =
            if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
        let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        values.push(Value::Integer(i64::from(limit)));

        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_records {where_clause}
             ORDER BY transaction_date DESC, id ASC LIMIT ?"
        );

        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt.query_map(params_from_iter(values), map_ledger_row).map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn find_flags(&self, ids: &[String]) -> DomainResult<HashMap<String, FlagCategory>> {
        let db = Arc::clone(&self.db);
        let ids = ids.to_vec();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            Self::select_flags(&conn, &ids)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, record: &LedgerRecord) -> DomainResult<UpsertOutcome> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        let outcome = task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            Self::upsert_row(&conn, &record).map(|outcome| (record.id, outcome))
        })
        .await
        .map_err(map_join_error)??;

        debug!(record_id = %outcome.0, outcome = ?outcome.1, "ledger row upserted");
        Ok(outcome.1)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<LedgerRecord>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("SELECT {LEDGER_COLUMNS} FROM ledger_records WHERE id = ?1"),
                params![id],
                map_ledger_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, filter: &LedgerFilter) -> DomainResult<Vec<LedgerRecord>> {
        let db = Arc::clone(&self.db);
        let filter = filter.clone();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            Self::select_filtered(&conn, &filter)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_flag(&self, id: &str, flag: Option<FlagCategory>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE ledger_records SET flag_category = ?1 WHERE id = ?2",
                    params![flag.map(|f| f.as_str()), id],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(LedgerError::NotFound(format!("ledger record {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

const LEDGER_COLUMNS: &str = "id, transaction_date, vendor_name, amount_cents, currency, memo, \
     branch, department, category, cardholder, status, transaction_type, sync_status, \
     flag_category, last_synced_at";

// The stored flag wins over the incoming one; `created_at` and `insert_nonce`
// are only written by the insert branch.
const LEDGER_UPSERT_SQL: &str = "INSERT INTO ledger_records (
        id, transaction_date, vendor_name, amount_cents, currency, memo, branch, department,
        category, cardholder, status, transaction_type, sync_status, flag_category,
        last_synced_at, created_at, insert_nonce
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15, ?16
    )
    ON CONFLICT(id) DO UPDATE SET
        transaction_date = excluded.transaction_date,
        vendor_name = excluded.vendor_name,
        amount_cents = excluded.amount_cents,
        currency = excluded.currency,
        memo = excluded.memo,
        branch = excluded.branch,
        department = excluded.department,
        category = excluded.category,
        cardholder = excluded.cardholder,
        status = excluded.status,
        transaction_type = excluded.transaction_type,
        sync_status = excluded.sync_status,
        flag_category = COALESCE(ledger_records.flag_category, excluded.flag_category),
        last_synced_at = excluded.last_synced_at
    RETURNING insert_nonce";

fn map_ledger_row(row: &Row<'_>) -> rusqlite::Result<LedgerRecord> {
    let sync_status: Option<String> = row.get(12)?;
    let flag_category: Option<String> = row.get(13)?;

    Ok(LedgerRecord {
        id: row.get(0)?,
        transaction_date: parse_date_column(1, &row.get::<_, String>(1)?)?,
        vendor_name: row.get(2)?,
        amount_cents: row.get(3)?,
        currency: row.get(4)?,
        memo: row.get(5)?,
        branch: row.get(6)?,
        department: row.get(7)?,
        category: row.get(8)?,
        cardholder: row.get(9)?,
        status: row.get(10)?,
        transaction_type: parse_column(11, row.get(11)?)?,
        sync_status: sync_status.map(|raw| parse_column(12, raw)).transpose()?,
        flag_category: flag_category.map(|raw| parse_column(13, raw)).transpose()?,
        last_synced_at: parse_timestamp_column(14, &row.get::<_, String>(14)?)?,
    })
}

pub(crate) fn parse_column<T>(index: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|msg| conversion_failure(index, msg))
}

fn parse_date_column(index: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| conversion_failure(index, err.to_string()))
}

pub(crate) fn parse_timestamp_column(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| conversion_failure(index, err.to_string()))
}

fn conversion_failure(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(LedgerError::Database(message)))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
