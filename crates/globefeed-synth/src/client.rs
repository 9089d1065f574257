//! HTTP client for a Gemini-style `generateContent` endpoint.
//!
//! Wraps `reqwest` with API-key management, typed response deserialization,
//! and retry on transient failures. Use [`LlmClient::new`] for production or
//! [`LlmClient::with_base_url`] to point at a mock server in tests.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SynthError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Client for the generative-model REST API.
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl LlmClient {
    /// Creates a client pointed at the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SynthError> {
        Self::with_base_url(
            api_key,
            model,
            timeout_secs,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SynthError::Api`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, SynthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| SynthError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Sends one prompt and returns the concatenated candidate text.
    ///
    /// Transient failures (timeout, connect, 5xx) are retried with back-off;
    /// everything else surfaces immediately.
    ///
    /// # Errors
    ///
    /// - [`SynthError::Api`] on a non-2xx status or an empty candidate list.
    /// - [`SynthError::Http`] on network failure.
    pub async fn generate(&self, prompt: &str) -> Result<String, SynthError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.generate_once(prompt)
        })
        .await
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, SynthError> {
        let endpoint = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| SynthError::Api(format!("invalid endpoint: {e}")))?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Body text is logged, never echoed to callers, so upstream
            // error payloads cannot leak through our API surface.
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, detail = %detail, "model call failed");
            return Err(SynthError::Api(format!("status {status}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SynthError::Api(format!("response parse error: {e}")))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SynthError::Api("empty candidate list".to_string()));
        }

        Ok(text)
    }
}
