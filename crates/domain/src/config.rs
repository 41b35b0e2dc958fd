//! Configuration structures
//!
//! Every section carries serde defaults so partial files and environment
//! overrides compose; [`Config::validate`] rejects configurations that are
//! missing credentials or endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CARD_HISTORICAL_MAX_PAGES, CARD_HISTORICAL_PAGE_SIZE, CARD_MAX_PAGES, CARD_PAGE_DELAY_MS,
    CARD_PAGE_SIZE, DEFAULT_FLAG_LOOKUP_CHUNK, ERP_MAX_PAGES, ERP_PAGE_SIZE,
    REQUEST_TIMEOUT_SECS,
};
use crate::{LedgerError, Result};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub card: CardApiConfig,
    pub erp: ErpConfig,
    pub slack: SlackConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
    pub branches: BranchNormalization,
}

impl Config {
    /// Check that the values needed to reach every upstream are present.
    pub fn validate(&self) -> Result<()> {
        require(&self.database.path, "database.path")?;
        require(&self.card.base_url, "card.base_url")?;
        require(&self.card.api_token, "card.api_token")?;
        require(&self.erp.base_url, "erp.base_url")?;
        require(&self.erp.account_id, "erp.account_id")?;
        require(&self.erp.consumer_key, "erp.consumer_key")?;
        require(&self.erp.consumer_secret, "erp.consumer_secret")?;
        require(&self.erp.token_id, "erp.token_id")?;
        require(&self.erp.token_secret, "erp.token_secret")?;
        require(&self.server.admin_token, "server.admin_token")?;

        if self.database.pool_size == 0 {
            return Err(LedgerError::Config("database.pool_size must be at least 1".into()));
        }
        if self.sync.flag_lookup_chunk == 0 {
            return Err(LedgerError::Config("sync.flag_lookup_chunk must be at least 1".into()));
        }
        Ok(())
    }
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Config(format!("{name} is required but not set")));
    }
    Ok(())
}

/// Ledger database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "spendledger.db".to_string(), pool_size: 4 }
    }
}

/// Names of the card platform's custom fields that feed ledger columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomFieldNames {
    pub branch: String,
    pub department: String,
    pub category: String,
    pub memo: Option<String>,
}

impl Default for CustomFieldNames {
    fn default() -> Self {
        Self {
            branch: "Branch".to_string(),
            department: "Department".to_string(),
            category: "Category".to_string(),
            memo: None,
        }
    }
}

/// Card-spend platform API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardApiConfig {
    pub base_url: String,
    pub api_token: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub historical_page_size: u32,
    pub historical_max_pages: u32,
    /// Fixed pause between page requests.
    pub page_delay_ms: u64,
    pub timeout_secs: u64,
    pub default_days_back: u32,
    pub include_incomplete: bool,
    pub field_names: CustomFieldNames,
}

impl Default for CardApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            page_size: CARD_PAGE_SIZE,
            max_pages: CARD_MAX_PAGES,
            historical_page_size: CARD_HISTORICAL_PAGE_SIZE,
            historical_max_pages: CARD_HISTORICAL_MAX_PAGES,
            page_delay_ms: CARD_PAGE_DELAY_MS,
            timeout_secs: REQUEST_TIMEOUT_SECS,
            default_days_back: 30,
            include_incomplete: true,
            field_names: CustomFieldNames::default(),
        }
    }
}

/// ERP API settings (token-based OAuth 1.0a).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    pub base_url: String,
    /// Account identifier, also used as the OAuth realm.
    pub account_id: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_id: String,
    pub token_secret: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub timeout_secs: u64,
    pub default_days_back: u32,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            account_id: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            token_id: String::new(),
            token_secret: String::new(),
            page_size: ERP_PAGE_SIZE,
            max_pages: ERP_MAX_PAGES,
            timeout_secs: REQUEST_TIMEOUT_SECS,
            default_days_back: 60,
        }
    }
}

/// Chat webhook settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    /// Post a summary after scheduled runs that did not succeed cleanly.
    pub notify_on_scheduled_runs: bool,
}

/// Scheduled reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub cron_expression: String,
    pub flag_lookup_chunk: usize,
    pub job_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: "0 0 */4 * * *".to_string(),
            flag_lookup_chunk: DEFAULT_FLAG_LOOKUP_CHUNK,
            job_timeout_secs: 1800,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Shared secret required as a bearer token on every route but `/health`.
    pub admin_token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1:8080".to_string(), admin_token: String::new() }
    }
}

/// One prefix substitution applied to branch names outside the alias table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRewrite {
    pub from: String,
    pub to: String,
}

/// Mapping from upstream branch spellings to canonical branch labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchNormalization {
    pub aliases: BTreeMap<String, String>,
    pub prefix_rewrites: Vec<PrefixRewrite>,
}

impl Default for BranchNormalization {
    fn default() -> Self {
        let aliases = [
            ("Phoenix:Phx - SouthEast", "Phoenix - SouthEast"),
            ("Phoenix:Phx - SouthWest", "Phoenix - SouthWest"),
            ("Phoenix:Phx - North", "Phoenix - North"),
            ("Phoenix:Phx - Central", "Phoenix - Central"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            aliases,
            prefix_rewrites: vec![PrefixRewrite {
                from: "Phoenix:Phx - ".to_string(),
                to: "Phoenix - ".to_string(),
            }],
        }
    }
}
