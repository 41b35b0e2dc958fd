//! Spendledger - expense reconciliation service
//!
//! Main entry point for the HTTP server and the sync scheduler.

use std::sync::Arc;

use anyhow::Context;
use spendledger_server::utils::logging::init_tracing;
use spendledger_server::{router, AppContext};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing()?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env file loaded"),
    }

    let config = spendledger_infra::config::load().context("loading configuration")?;
    let ctx = Arc::new(AppContext::new(config).context("initialising application context")?);

    let mut scheduler = ctx.scheduler();
    if ctx.config.sync.enabled {
        scheduler.start().await.context("starting sync scheduler")?;
    } else {
        info!("scheduled syncs disabled");
    }

    let bind_address = ctx.config.server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    info!(address = %bind_address, "spendledger listening");

    axum::serve(listener, router(ctx.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    if scheduler.is_running() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "sync scheduler did not stop cleanly");
        }
    }
    info!("spendledger stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
