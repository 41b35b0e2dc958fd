//! Ledger reads and reviewer flag edits

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use spendledger_domain::{FlagCategory, LedgerError, LedgerFilter, LedgerRecord};
use tracing::info;

use crate::error::ApiResult;
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct FlagBody {
    /// `null` clears the flag.
    pub flag: Option<FlagCategory>,
}

/// `GET /ledger?type=&flag=&from=&to=&limit=`
pub async fn list_ledger(
    State(ctx): State<Arc<AppContext>>,
    Query(filter): Query<LedgerFilter>,
) -> ApiResult<Json<Vec<LedgerRecord>>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(LedgerError::InvalidInput(format!("from ({from}) is after to ({to})")).into());
        }
    }
    Ok(Json(ctx.ledger.list(&filter).await?))
}

/// `PUT /ledger/{id}/flag`: the only path that can overwrite a stored flag.
pub async fn set_flag(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<FlagBody>,
) -> ApiResult<Json<LedgerRecord>> {
    ctx.ledger.set_flag(&id, body.flag).await?;
    info!(ledger_id = %id, flag = ?body.flag, "reviewer flag updated");

    let record = ctx
        .ledger
        .get(&id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("ledger record {id}")))?;
    Ok(Json(record))
}
