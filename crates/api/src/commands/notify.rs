//! Ad-hoc chat notifications

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use spendledger_core::ChatMessage;
use spendledger_domain::LedgerError;

use crate::error::ApiResult;
use crate::AppContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyBody {
    pub text: String,
    /// Attach the fields of this ledger row to the message.
    #[serde(default)]
    pub ledger_id: Option<String>,
}

/// `POST /notify`
pub async fn notify(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<NotifyBody>,
) -> ApiResult<Json<Value>> {
    let notifier = ctx
        .notifier
        .as_ref()
        .ok_or_else(|| LedgerError::InvalidInput("chat webhook is not configured".into()))?;

    let message = match body.ledger_id.as_deref() {
        Some(id) => {
            let record = ctx
                .ledger
                .get(id)
                .await?
                .ok_or_else(|| LedgerError::NotFound(format!("ledger record {id}")))?;
            ChatMessage::ledger_record(&record, body.text)
        }
        None => ChatMessage::new(body.text),
    };

    notifier.notify(&message).await?;
    Ok(Json(json!({ "delivered": true })))
}
