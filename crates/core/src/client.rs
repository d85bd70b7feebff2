//! Resilient HTTP client for the traktamente rowstore endpoint.

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::types::UpstreamResponse;
use bytes::Bytes;
use reqwest::{header, Client};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Client for the dataset endpoint.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct TraktamenteClient {
    http: Client,
    endpoint: Url,
    config: Arc<UpstreamConfig>,
}

impl TraktamenteClient {
    /// Create a new client with the given configuration.
    pub fn new(config: Arc<UpstreamConfig>) -> UpstreamResult<Self> {
        let endpoint = Url::parse(&config.url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Build the request URL for the given query pairs.
    pub fn build_url(&self, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Fetch one page of rows.
    ///
    /// Transport failures and retryable statuses are retried with linear
    /// backoff. Cancelling `cancel` aborts the in-flight attempt and any
    /// pending backoff.
    pub async fn fetch(
        &self,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> UpstreamResult<UpstreamResponse> {
        let url = self.build_url(params);
        let retry_config = &self.config.retry;
        let mut retries = 0;

        debug!(url = %url, "GET request");

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
                outcome = self.attempt(url.clone()) => outcome,
            };

            match outcome {
                Ok(body) => {
                    let response: UpstreamResponse = serde_json::from_slice(&body)?;
                    debug!(
                        rows = response.results.len(),
                        attempts = retries + 1,
                        "Upstream request succeeded"
                    );
                    return Ok(response);
                }
                Err(err)
                    if retries < retry_config.max_retries && err.is_retryable(retry_config) =>
                {
                    retries += 1;
                    let backoff = retry_config.backoff_for_attempt(retries);
                    warn!(
                        error = %err,
                        attempt = retries,
                        backoff_ms = backoff.as_millis(),
                        "Request failed, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One GET round trip. Non-success statuses become `UpstreamError::Status`.
    async fn attempt(&self, url: Url) -> UpstreamResult<Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.bytes().await.map_err(UpstreamError::from_transport)
    }
}
