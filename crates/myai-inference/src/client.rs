// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the inference server hosting the model pipelines.
//!
//! Provides [`InferenceClient`] which handles JSON request construction,
//! error body decoding, and transient error retry.

use std::time::Duration;

use myai_core::MyaiError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::ApiErrorResponse;

/// Default upper bound on a single request, covering slow CPU generation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound for `/health` so a stuck server reports unhealthy quickly.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for inference server communication.
///
/// Manages connection pooling and retry logic for transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl InferenceClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, MyaiError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| MyaiError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Overrides the delay between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends `body` as JSON to `path` and decodes the JSON response.
    ///
    /// On transient errors (429, 500, 503), retries once after a delay.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, MyaiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying inference request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| MyaiError::Provider {
                    message: format!("HTTP request to {path} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "inference response received");

            if status.is_success() {
                let bytes = response.bytes().await.map_err(|e| MyaiError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_slice(&bytes).map_err(|e| MyaiError::Provider {
                    message: format!("failed to parse {path} response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let message = describe_error(status, &body);

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(MyaiError::provider(message));
                continue;
            }

            return Err(MyaiError::provider(message));
        }

        Err(last_error
            .unwrap_or_else(|| MyaiError::provider(format!("request to {path} failed after retries"))))
    }

    /// Probes `GET /health`.
    pub async fn health(&self) -> Result<(), MyaiError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| MyaiError::Provider {
                message: format!("health probe failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(MyaiError::provider(format!(
                "health probe returned {}",
                response.status()
            )))
        }
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "inference server error ({}): {}",
            api_err.error.type_, api_err.error.message
        ),
        Err(_) => format!("inference server returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
