#![allow(dead_code)]

use std::sync::Arc;

use spendledger_domain::config::{CardApiConfig, ErpConfig};
use spendledger_infra::database::DbManager;
use tempfile::TempDir;
use wiremock::{Match, Request};

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated database in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("ledger.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema should be created");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

/// Card API settings pointed at a mock server, without page delays.
pub fn card_config(base_url: &str) -> CardApiConfig {
    CardApiConfig {
        base_url: base_url.to_string(),
        api_token: "card-token".to_string(),
        page_delay_ms: 0,
        timeout_secs: 5,
        ..CardApiConfig::default()
    }
}

/// ERP settings pointed at a mock server.
pub fn erp_config(base_url: &str) -> ErpConfig {
    ErpConfig {
        base_url: base_url.to_string(),
        account_id: "1234567".to_string(),
        consumer_key: "ck".to_string(),
        consumer_secret: "cs".to_string(),
        token_id: "ti".to_string(),
        token_secret: "ts".to_string(),
        timeout_secs: 5,
        ..ErpConfig::default()
    }
}

/// Matches when the `filter` query parameter contains the given clause.
pub struct FilterContains(pub &'static str);

impl Match for FilterContains {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, value)| key == "filter" && value.contains(self.0))
    }
}

/// Matches first-page requests (no pagination cursor).
pub struct NoCursor;

impl Match for NoCursor {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == "nextPage")
    }
}

/// Matches requests carrying an OAuth 1.0a Authorization header for `realm`.
pub struct SignedFor(pub &'static str);

impl Match for SignedFor {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value.starts_with(&format!("OAuth realm=\"{}\"", self.0))
                    && value.contains("oauth_signature_method=\"HMAC-SHA256\"")
            })
    }
}
