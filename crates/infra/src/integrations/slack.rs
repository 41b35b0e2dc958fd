//! Chat notifications through an incoming-webhook URL

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use spendledger_core::{ChatMessage, ChatNotifier};
use spendledger_domain::config::SlackConfig;
use spendledger_domain::constants::REQUEST_TIMEOUT_SECS;
use spendledger_domain::{LedgerError, Result};
use tracing::debug;

use crate::http::HttpClient;

const SERVICE: &str = "slack";
/// Block Kit rejects section blocks with more than ten fields.
const MAX_FIELDS_PER_SECTION: usize = 10;

/// Posts [`ChatMessage`]s to a Slack incoming webhook.
pub struct SlackNotifier {
    http: HttpClient,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .service(SERVICE)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .max_attempts(1)
            .build()?;
        Ok(Self { http, webhook_url: webhook_url.into() })
    }

    /// Notifier for the configured webhook, or `None` when notifications are off.
    pub fn from_config(config: &SlackConfig) -> Result<Option<Self>> {
        match config.webhook_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Self::new(url).map(Some),
            _ => Ok(None),
        }
    }

    /// Block Kit payload for a message.
    pub fn payload(message: &ChatMessage) -> Value {
        let mut blocks = vec![json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": message.text },
        })];

        for chunk in message.fields.chunks(MAX_FIELDS_PER_SECTION) {
            let fields: Vec<Value> = chunk
                .iter()
                .map(|(label, value)| json!({ "type": "mrkdwn", "text": format!("*{label}*\n{value}") }))
                .collect();
            blocks.push(json!({ "type": "section", "fields": fields }));
        }

        json!({ "text": message.text, "blocks": blocks })
    }
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn notify(&self, message: &ChatMessage) -> Result<()> {
        if message.text.trim().is_empty() {
            return Err(LedgerError::InvalidInput("chat message text is empty".into()));
        }

        let request = self.http.request(Method::POST, &self.webhook_url).json(&Self::payload(message));
        let response = self.http.send(request).await?;
        self.http.ensure_success(response).await?;
        debug!(fields = message.fields.len(), "chat notification delivered");
        Ok(())
    }
}
