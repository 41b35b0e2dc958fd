//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. Validates the result before returning it
//!
//! ## Environment Variables
//! Required:
//! - `SPENDLEDGER_CARD_BASE_URL`, `SPENDLEDGER_CARD_API_TOKEN`
//! - `SPENDLEDGER_ERP_BASE_URL`, `SPENDLEDGER_ERP_ACCOUNT_ID`
//! - `SPENDLEDGER_ERP_CONSUMER_KEY`, `SPENDLEDGER_ERP_CONSUMER_SECRET`
//! - `SPENDLEDGER_ERP_TOKEN_ID`, `SPENDLEDGER_ERP_TOKEN_SECRET`
//! - `SPENDLEDGER_ADMIN_TOKEN`
//!
//! Optional (struct defaults apply when unset):
//! - `SPENDLEDGER_DB_PATH`, `SPENDLEDGER_DB_POOL_SIZE`
//! - `SPENDLEDGER_CARD_PAGE_DELAY_MS`, `SPENDLEDGER_CARD_TIMEOUT_SECS`
//! - `SPENDLEDGER_CARD_INCLUDE_INCOMPLETE`
//! - `SPENDLEDGER_SLACK_WEBHOOK_URL`, `SPENDLEDGER_SLACK_NOTIFY_SCHEDULED`
//! - `SPENDLEDGER_SYNC_ENABLED`, `SPENDLEDGER_SYNC_CRON`
//! - `SPENDLEDGER_BIND_ADDRESS`
//!
//! Branch aliases are only read from files.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./spendledger.json` or `./spendledger.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use spendledger_domain::{Config, LedgerError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `LedgerError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Every required variable must be present; optional ones override the struct
/// defaults.
///
/// # Errors
/// Returns `LedgerError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.card.base_url = env_var("SPENDLEDGER_CARD_BASE_URL")?;
    config.card.api_token = env_var("SPENDLEDGER_CARD_API_TOKEN")?;
    config.erp.base_url = env_var("SPENDLEDGER_ERP_BASE_URL")?;
    config.erp.account_id = env_var("SPENDLEDGER_ERP_ACCOUNT_ID")?;
    config.erp.consumer_key = env_var("SPENDLEDGER_ERP_CONSUMER_KEY")?;
    config.erp.consumer_secret = env_var("SPENDLEDGER_ERP_CONSUMER_SECRET")?;
    config.erp.token_id = env_var("SPENDLEDGER_ERP_TOKEN_ID")?;
    config.erp.token_secret = env_var("SPENDLEDGER_ERP_TOKEN_SECRET")?;
    config.server.admin_token = env_var("SPENDLEDGER_ADMIN_TOKEN")?;

    if let Some(path) = env_opt("SPENDLEDGER_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_parse("SPENDLEDGER_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(delay) = env_parse("SPENDLEDGER_CARD_PAGE_DELAY_MS")? {
        config.card.page_delay_ms = delay;
    }
    if let Some(timeout) = env_parse("SPENDLEDGER_CARD_TIMEOUT_SECS")? {
        config.card.timeout_secs = timeout;
    }
    config.card.include_incomplete =
        env_bool("SPENDLEDGER_CARD_INCLUDE_INCOMPLETE", config.card.include_incomplete);

    config.slack.webhook_url = env_opt("SPENDLEDGER_SLACK_WEBHOOK_URL");
    config.slack.notify_on_scheduled_runs =
        env_bool("SPENDLEDGER_SLACK_NOTIFY_SCHEDULED", config.slack.notify_on_scheduled_runs);

    config.sync.enabled = env_bool("SPENDLEDGER_SYNC_ENABLED", config.sync.enabled);
    if let Some(cron) = env_opt("SPENDLEDGER_SYNC_CRON") {
        config.sync.cron_expression = cron;
    }
    if let Some(bind) = env_opt("SPENDLEDGER_BIND_ADDRESS") {
        config.server.bind_address = bind;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `LedgerError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LedgerError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LedgerError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LedgerError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(LedgerError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
        candidates.extend(vec![cwd.join("../config.json"), cwd.join("../config.toml")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    ["config.json", "config.toml", "spendledger.json", "spendledger.toml"]
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `LedgerError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        LedgerError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| LedgerError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED: [(&str, &str); 9] = [
        ("SPENDLEDGER_CARD_BASE_URL", "https://cards.example.com"),
        ("SPENDLEDGER_CARD_API_TOKEN", "card-token"),
        ("SPENDLEDGER_ERP_BASE_URL", "https://erp.example.com"),
        ("SPENDLEDGER_ERP_ACCOUNT_ID", "1234567"),
        ("SPENDLEDGER_ERP_CONSUMER_KEY", "ck"),
        ("SPENDLEDGER_ERP_CONSUMER_SECRET", "cs"),
        ("SPENDLEDGER_ERP_TOKEN_ID", "ti"),
        ("SPENDLEDGER_ERP_TOKEN_SECRET", "ts"),
        ("SPENDLEDGER_ADMIN_TOKEN", "admin"),
    ];

    fn set_required() {
        for (key, value) in REQUIRED {
            std::env::set_var(key, value);
        }
    }

    fn clear_required() {
        for (key, _) in REQUIRED {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("SPENDLEDGER_TEST_BOOL_ON", "On");
        std::env::set_var("SPENDLEDGER_TEST_BOOL_OFF", "0");

        assert!(env_bool("SPENDLEDGER_TEST_BOOL_ON", false));
        assert!(!env_bool("SPENDLEDGER_TEST_BOOL_OFF", true));
        std::env::remove_var("SPENDLEDGER_TEST_BOOL_MISSING");
        assert!(env_bool("SPENDLEDGER_TEST_BOOL_MISSING", true));

        std::env::remove_var("SPENDLEDGER_TEST_BOOL_ON");
        std::env::remove_var("SPENDLEDGER_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_required_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required();
        std::env::set_var("SPENDLEDGER_DB_POOL_SIZE", "8");
        std::env::set_var("SPENDLEDGER_SYNC_ENABLED", "false");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.card.api_token, "card-token");
        assert_eq!(config.erp.account_id, "1234567");
        assert_eq!(config.database.pool_size, 8);
        assert!(!config.sync.enabled);
        assert!(config.validate().is_ok());

        clear_required();
        std::env::remove_var("SPENDLEDGER_DB_POOL_SIZE");
        std::env::remove_var("SPENDLEDGER_SYNC_ENABLED");
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required();
        std::env::remove_var("SPENDLEDGER_ERP_TOKEN_SECRET");

        let err = load_from_env().unwrap_err();
        assert!(
            matches!(err, LedgerError::Config(ref msg) if msg.contains("SPENDLEDGER_ERP_TOKEN_SECRET"))
        );

        clear_required();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        set_required();
        std::env::set_var("SPENDLEDGER_DB_POOL_SIZE", "not-a-number");

        let result = load_from_env();
        assert!(matches!(result, Err(LedgerError::Config(_))));

        clear_required();
        std::env::remove_var("SPENDLEDGER_DB_POOL_SIZE");
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[database]
path = "ledger.db"

[card]
base_url = "https://cards.example.com"
api_token = "card-token"
page_delay_ms = 0

[sync]
enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("Should load config from TOML file");
        assert_eq!(config.database.path, "ledger.db");
        assert_eq!(config.card.page_delay_ms, 0);
        assert!(!config.sync.enabled);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_parse_config_json() {
        let json_content = r#"{
            "erp": { "account_id": "TSTDRV1", "page_size": 500 },
            "branches": { "aliases": { "Mesa:Msa - East": "Mesa - East" } }
        }"#;

        let config = parse_config(json_content, &PathBuf::from("test.json")).unwrap();
        assert_eq!(config.erp.account_id, "TSTDRV1");
        assert_eq!(config.erp.page_size, 500);
        assert_eq!(config.branches.aliases.len(), 1);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
