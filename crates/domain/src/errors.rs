//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Spendledger
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Upstream API answered with a non-2xx status.
    #[error("{service} API error (HTTP {status}): {body}")]
    Upstream { service: String, status: u16, body: String },

    /// Upstream API did not answer within the request ceiling.
    #[error("{service} request timed out: {message}")]
    Timeout { service: String, message: String },
}

impl LedgerError {
    /// Stable label suitable for logging fields and JSON error payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
            Self::Upstream { .. } => "upstream",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Result type alias for Spendledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
