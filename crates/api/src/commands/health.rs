//! Liveness and database health

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task;

use crate::AppContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub checked_at: DateTime<Utc>,
}

/// `GET /health`: `ok` when the ledger database answers, `degraded` (503)
/// otherwise. Never requires the admin token.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> (StatusCode, Json<HealthResponse>) {
    let db = ctx.db.clone();
    let check = task::spawn_blocking(move || db.health_check())
        .await
        .map_err(|err| err.to_string())
        .and_then(|result| result.map_err(|err| err.to_string()));

    let (code, status, database) = match check {
        Ok(()) => (StatusCode::OK, "ok", "ok".to_string()),
        Err(message) => {
            tracing::warn!(error = %message, "database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", message)
        }
    };

    (code, Json(HealthResponse { status, database, checked_at: Utc::now() }))
}
