#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use spendledger_domain::Config;
use spendledger_server::{router, AppContext};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Application wired to a temporary ledger database and mock upstreams.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    /// `upstream` serves both the card and ERP APIs; `webhook` is the chat
    /// webhook URL, if any.
    pub fn new(upstream: &str, webhook: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");

        let mut config = Config::default();
        config.database.path = temp_dir.path().join("ledger.db").to_string_lossy().into_owned();
        config.card.base_url = upstream.to_string();
        config.card.api_token = "card-token".into();
        config.card.page_delay_ms = 0;
        config.card.timeout_secs = 5;
        config.erp.base_url = upstream.to_string();
        config.erp.account_id = "1234567".into();
        config.erp.consumer_key = "ck".into();
        config.erp.consumer_secret = "cs".into();
        config.erp.token_id = "ti".into();
        config.erp.token_secret = "ts".into();
        config.erp.timeout_secs = 5;
        config.server.admin_token = ADMIN_TOKEN.into();
        config.slack.webhook_url = webhook;
        config.sync.enabled = false;

        let ctx = Arc::new(AppContext::new(config).expect("context should build"));
        Self { router: router(ctx.clone()), ctx, _temp_dir: temp_dir }
    }

    /// Send an authorised request and return status plus JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(ADMIN_TOKEN)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self.router.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}
