//! Remote weather service client

use super::{ProviderError, WeatherProvider, WeatherSnapshot};
use async_trait::async_trait;
use farmlog_common::config::WeatherConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// HTTP client returning current conditions for a region
pub struct HttpWeatherClient {
    client: Client,
    base_url: String,
}

impl HttpWeatherClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from configuration; `Ok(None)` when no base URL is configured
    pub fn from_config(config: &WeatherConfig) -> Result<Option<Self>, ProviderError> {
        match config.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                Self::new(url, Duration::from_millis(config.timeout_ms)).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl WeatherProvider for HttpWeatherClient {
    async fn current_weather(&self, region: &str) -> Result<WeatherSnapshot, ProviderError> {
        let response = self
            .client
            .get(format!("{}/current", self.base_url))
            .query(&[("region", region)])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(format!("weather for {}", region))),
            status if !status.is_success() => Err(ProviderError::Request(format!(
                "weather service returned {}",
                status
            ))),
            _ => response
                .json::<WeatherSnapshot>()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string())),
        }
    }
}
