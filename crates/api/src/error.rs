//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use spendledger_domain::LedgerError;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid admin token")]
    Unauthorized,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Ledger(err) => match err {
                LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::Auth(_) => StatusCode::UNAUTHORIZED,
                LedgerError::Upstream { .. } | LedgerError::Network(_) => StatusCode::BAD_GATEWAY,
                LedgerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                LedgerError::Database(_) | LedgerError::Config(_) | LedgerError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Ledger(err) => err.label(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }

        let body = ErrorResponse { error: self.label().to_string(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
