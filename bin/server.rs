// Banks API - Web Server
// REST API with Axum over a SQLite bank store

use anyhow::Context;
use banks_api::{
    config::DEFAULT_LOG_FILTER, logging::init_logging, router, AppState, BankService, BankStore,
    Config, RemoteMirror,
};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(DEFAULT_LOG_FILTER, config.log_format)?;

    // Open database
    let store = if config.is_in_memory() {
        BankStore::open_in_memory()
    } else {
        BankStore::open(&config.database_path)
    }
    .with_context(|| format!("Failed to open database at {}", config.database_path))?;

    info!(path = %config.database_path, "Database opened");

    let mirror = RemoteMirror::new(config.api_url.clone(), config.http_timeout)
        .context("Failed to build remote banks client")?;

    // Create shared state
    let state = AppState::new(BankService::new(Arc::new(store), mirror));
    let app = router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        peer = %config.api_url,
        "Banks API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
