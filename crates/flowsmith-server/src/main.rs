//! Binary entrypoint for the flowchart server.
//!
//! All settings come from environment variables, see [`ServerConfig`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use flowsmith_llm::LlmClient;
use flowsmith_server::config::{LOG_DIR_VAR, ServerConfig};
use flowsmith_server::router::build_router;
use flowsmith_server::state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let log_dir = std::env::var_os(LOG_DIR_VAR)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);
    let _guard = flowsmith_server::logging::init(log_dir.as_deref())?;

    let config = ServerConfig::from_env();
    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; requests will likely fall back");
    }

    let client = LlmClient::new(config.llm.clone())?;
    let app = build_router(AppState::new(client, config.locale));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "flowsmith server listening on {}",
        addr
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
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
