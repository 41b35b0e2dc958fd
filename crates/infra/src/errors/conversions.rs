//! Conversions from storage and transport errors into [`LedgerError`].
//!
//! Only failures the ledger store, the connection pool and the upstream
//! clients can actually hit get their own arm. Upstream status codes never
//! reach this module: [`crate::http::HttpClient`] turns them into
//! `LedgerError::Upstream` itself.

use reqwest::Error as HttpError;
use rusqlite::ffi::ErrorCode;
use rusqlite::Error as SqlError;
use spendledger_domain::LedgerError;

/// Newtype that keeps the foreign `From` impls on the infrastructure side.
#[derive(Debug)]
pub struct InfraError(pub LedgerError);

impl From<InfraError> for LedgerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LedgerError> for InfraError {
    fn from(value: LedgerError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        let mapped = match value {
            SqlError::SqliteFailure(err, message) => match err.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    LedgerError::Database("ledger database is busy; retry the request".into())
                }
                // enum columns carry CHECK constraints
                ErrorCode::ConstraintViolation => LedgerError::Database(format!(
                    "ledger row rejected by constraint: {}",
                    message.unwrap_or_default()
                )),
                _ => LedgerError::Database(format!(
                    "sqlite failure {:?}: {}",
                    err.code,
                    message.unwrap_or_default()
                )),
            },
            SqlError::QueryReturnedNoRows => LedgerError::NotFound("no matching ledger row".into()),
            SqlError::FromSqlConversionFailure(column, _, cause) => {
                LedgerError::Database(format!("unreadable value in column {column}: {cause}"))
            }
            SqlError::InvalidColumnType(_, name, ty) => {
                LedgerError::Database(format!("column {name} holds unexpected type {ty}"))
            }
            other => LedgerError::Database(other.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(LedgerError::Database(format!("no ledger connection available: {value}")))
    }
}

/// Transport failures only. Timeouts are labelled `http` here; the calling
/// client relabels them with its own service name.
impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let mapped = if value.is_timeout() {
            LedgerError::Timeout { service: "http".into(), message: "request timed out".into() }
        } else if value.is_builder() {
            LedgerError::Internal(format!("invalid HTTP request: {value}"))
        } else if value.is_connect() {
            LedgerError::Network(format!("connection failed: {value}"))
        } else {
            LedgerError::Network(value.to_string())
        };
        InfraError(mapped)
    }
}
