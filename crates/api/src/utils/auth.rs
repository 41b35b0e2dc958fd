//! Admin bearer-token guard

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::ApiError;
use crate::AppContext;

/// Reject requests that do not carry `Authorization: Bearer <admin_token>`.
pub async fn require_admin(
    State(ctx): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorised = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token_matches(token.trim(), &ctx.config.server.admin_token));

    if !authorised {
        warn!(path = %request.uri().path(), "request without a valid admin token");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Constant-time comparison; an empty configured token matches nothing.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() || presented.len() != expected.len() {
        return false;
    }
    presented.bytes().zip(expected.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}
