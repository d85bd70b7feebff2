use anyhow::{Context, Result};
use std::sync::Arc;
use traktamente_core::Settings;
use traktamente_mcp::{McpServer, Toolbox};

/// Shared state for both transports
pub struct AppState {
    pub mcp: Arc<McpServer>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self> {
        let toolbox =
            Toolbox::from_settings(settings).context("Failed to build the dataset client")?;

        tracing::info!("Dataset endpoint: {}", settings.upstream.url);
        tracing::info!(
            "Output budget: {} characters",
            settings.output.character_limit
        );

        Ok(Self::from_toolbox(toolbox))
    }

    pub fn from_toolbox(toolbox: Toolbox) -> Self {
        Self {
            mcp: Arc::new(McpServer::new(Arc::new(toolbox))),
        }
    }
}
