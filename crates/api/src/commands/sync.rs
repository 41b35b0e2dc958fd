//! Manually triggered sync runs and the run history

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use spendledger_core::{SyncPipeline, WorkSetSource};
use spendledger_domain::{LedgerError, SyncReport, SyncRun};
use spendledger_infra::integrations::{BillSyncRequest, CardSyncRequest, FetchMode};
use tracing::info;

use crate::error::ApiResult;
use crate::AppContext;

const DEFAULT_RUN_LIMIT: u32 = 20;
const MAX_RUN_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardSyncBody {
    pub days_back: Option<u32>,
    pub include_incomplete: Option<bool>,
    /// Use the historical page size and ceiling.
    pub historical: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillSyncBody {
    pub days_back: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunsQuery {
    pub limit: Option<u32>,
}

/// `POST /sync/card`
pub async fn sync_card(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CardSyncBody>,
) -> ApiResult<Json<SyncReport>> {
    let defaults = ctx.default_card_request();
    let request = CardSyncRequest {
        days_back: body.days_back.unwrap_or(defaults.days_back),
        include_incomplete: body.include_incomplete.unwrap_or(defaults.include_incomplete),
        mode: if body.historical { FetchMode::Historical } else { FetchMode::Routine },
    };
    info!(days_back = request.days_back, historical = body.historical, "card sync requested");

    let report = run_detached(ctx.pipeline.clone(), ctx.card_source(request)).await?;
    Ok(Json(report))
}

/// `POST /sync/bills`
pub async fn sync_bills(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<BillSyncBody>,
) -> ApiResult<Json<SyncReport>> {
    let request =
        BillSyncRequest { days_back: body.days_back.unwrap_or(ctx.default_bill_request().days_back) };
    info!(days_back = request.days_back, "bill sync requested");

    let report = run_detached(ctx.pipeline.clone(), ctx.bill_source(request)).await?;
    Ok(Json(report))
}

/// `GET /sync/runs?limit=`: newest first.
pub async fn list_runs(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<RunsQuery>,
) -> ApiResult<Json<Vec<SyncRun>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RUN_LIMIT).clamp(1, MAX_RUN_LIMIT);
    Ok(Json(ctx.run_log.recent(limit).await?))
}

/// Run on a spawned task so a dropped client connection does not cancel a
/// run that has already started.
async fn run_detached<S>(pipeline: Arc<SyncPipeline>, source: S) -> ApiResult<SyncReport>
where
    S: WorkSetSource + 'static,
{
    let report = tokio::spawn(async move { pipeline.run(&source).await })
        .await
        .map_err(|err| LedgerError::Internal(format!("sync task failed: {err}")))??;
    Ok(report)
}
