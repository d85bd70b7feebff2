use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use traktamente_core::Settings;

mod api;
mod config;

use config::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST /mcp
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "traktamente")]
#[command(about = "MCP server for Skatteverket traktamente (per diem) rates", long_about = None)]
struct Args {
    /// Transport, as a positional shorthand (`traktamente http`)
    #[arg(value_enum)]
    mode: Option<Transport>,

    /// Transport to serve MCP over
    #[arg(short, long, value_enum, env = "TRANSPORT", default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Path to configuration file
    #[arg(short, long, env = "TRAKTAMENTE_CONFIG", default_value = "traktamente.toml")]
    config: PathBuf,

    /// Port to listen on (http transport)
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host to bind to (http transport)
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

impl Args {
    fn transport(&self) -> Transport {
        self.mode.unwrap_or(self.transport)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the protocol channel in stdio mode
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let transport = args.transport();

    tracing::info!(?transport, "Starting Traktamente MCP server");

    let settings = Settings::load(&args.config)?;
    let state = AppState::new(&settings)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
            ctrl_c.cancel();
        }
    });

    match transport {
        Transport::Stdio => state.mcp.clone().start(shutdown).await?,
        Transport::Http => {
            let addr = format!("{}:{}", args.host, args.port);
            api::serve(&addr, state, shutdown).await?;
        }
    }

    Ok(())
}
