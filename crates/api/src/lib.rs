//! # Spendledger Server
//!
//! HTTP application layer - routes and main entry point.
//!
//! This crate contains:
//! - Route handlers (sync triggers, ledger reads, flag edits, notifications)
//! - Application context (dependency injection)
//! - Admin-token guard and tracing setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod error;
pub mod utils;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

pub use context::AppContext;
pub use error::{ApiError, ApiResult};

/// Build the router. Everything except `/health` sits behind the admin token.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let protected = Router::new()
        .route("/sync/card", post(commands::sync_card))
        .route("/sync/bills", post(commands::sync_bills))
        .route("/sync/runs", get(commands::list_runs))
        .route("/ledger", get(commands::list_ledger))
        .route("/ledger/{id}/flag", put(commands::set_flag))
        .route("/notify", post(commands::notify))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), utils::auth::require_admin));

    Router::new().route("/health", get(commands::health)).merge(protected).with_state(ctx)
}
