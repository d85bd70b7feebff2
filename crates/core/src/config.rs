//! Configuration for the upstream client and output rendering.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Rowstore endpoint of the Skatteverket "Normalbelopp" dataset.
pub const DEFAULT_DATASET_URL: &str =
    "https://skatteverket.entryscape.net/rowstore/dataset/70ccea31-b64c-4bf5-84c7-673f04f32505";

/// Maximum rendered response size in characters.
pub const DEFAULT_CHARACTER_LIMIT: usize = 25_000;

/// Top-level settings, loaded once at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when it is missing.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                path = %config_path.display(),
                "Configuration file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read configuration file")?;
        let settings: Self =
            toml::from_str(&content).context("Failed to parse configuration file")?;

        tracing::info!(path = %config_path.display(), "Loaded configuration");
        Ok(settings)
    }
}

/// Configuration for the dataset client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Dataset endpoint. Query parameters are appended per request.
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_url() -> String {
    DEFAULT_DATASET_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("traktamente-mcp/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

impl UpstreamConfig {
    /// Create a configuration for the given endpoint with default limits.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; retry `n` waits `n * backoff_step_ms`.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// HTTP status codes to retry on.
    #[serde(default = "default_retry_on_status_codes")]
    pub retry_on_status_codes: Vec<u16>,
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_step_ms() -> u64 {
    1_000
}

fn default_retry_on_status_codes() -> Vec<u16> {
    vec![408, 413, 429, 500, 502, 503, 504]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
            retry_on_status_codes: default_retry_on_status_codes(),
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Linear backoff before the given retry (1-based).
    pub fn backoff_for_attempt(&self, retry: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(retry)))
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}

/// Configuration for rendered tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_character_limit")]
    pub character_limit: usize,
}

fn default_character_limit() -> usize {
    DEFAULT_CHARACTER_LIMIT
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            character_limit: default_character_limit(),
        }
    }
}
