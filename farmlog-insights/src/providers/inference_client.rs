//! Remote inference service client
//!
//! Backs the enhancement tier of the weather, financial and growth signals.
//! Requests are rate-limited client-side and bounded by an HTTP timeout;
//! the aggregator applies its own per-call timeout on top.

use super::{InferenceRequest, InferenceService, ProviderError};
use async_trait::async_trait;
use farmlog_common::config::InferenceConfig;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the inference service
pub struct HttpInferenceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: DefaultDirectRateLimiter,
}

impl HttpInferenceClient {
    /// Build a client for `base_url`
    ///
    /// # Errors
    /// Returns `ProviderError::Unavailable` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Build from configuration; `Ok(None)` when no base URL is configured
    pub fn from_config(config: &InferenceConfig) -> Result<Option<Self>, ProviderError> {
        match config.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Self::new(
                url,
                config.api_key.clone(),
                Duration::from_millis(config.timeout_ms),
                config.requests_per_second,
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/analyze", self.base_url)
    }
}

#[async_trait]
impl InferenceService for HttpInferenceClient {
    async fn analyze(&self, request: &InferenceRequest) -> Result<serde_json::Value, ProviderError> {
        self.rate_limiter.until_ready().await;

        debug!(kind = %request.kind, farm_id = %request.farm_id, "Sending inference request");

        let mut builder = self.client.post(self.endpoint()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Request(format!("inference request timed out: {}", e))
            } else {
                ProviderError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Request(format!(
                "inference service returned {}",
                status
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}
