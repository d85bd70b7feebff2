// Standalone MCP server binary (stdio transport)

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use traktamente_core::Settings;
use traktamente_mcp::{McpServer, Toolbox};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Traktamente MCP server starting...");

    let config_path = std::env::var("TRAKTAMENTE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("traktamente.toml"));
    let settings = Settings::load(&config_path)?;

    let toolbox = Toolbox::from_settings(&settings)?;
    tracing::info!(
        "Registered {} tools against {}",
        toolbox.list_schemas().len(),
        settings.upstream.url
    );

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
            ctrl_c.cancel();
        }
    });

    let server = Arc::new(McpServer::new(Arc::new(toolbox)));
    server.start(shutdown).await?;

    Ok(())
}
