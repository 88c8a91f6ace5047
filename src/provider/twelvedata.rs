//! TwelveData REST client for profile and symbol search

use reqwest::Client;
use std::time::Duration;

/// Configuration for the provider client
#[derive(Clone)]
pub struct ProviderConfig {
    /// REST base URL
    pub base_url: String,
    /// TwelveData API key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<&crate::config::Config> for ProviderConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            base_url: config.api.provider_url.clone(),
            api_key: config.feed.api_key.clone(),
            timeout: config.api.provider_timeout,
        }
    }
}

/// Provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with a non-success status
    #[error("{message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Client for TwelveData's REST endpoints
pub struct TwelveDataClient {
    config: ProviderConfig,
    client: Client,
}

impl TwelveDataClient {
    /// Create a new client
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Fetch the profile of a stock by symbol
    pub async fn profile(&self, symbol: &str) -> Result<serde_json::Value, ProviderError> {
        self.get("profile", symbol).await
    }

    /// Search for symbols matching a keyword
    pub async fn symbol_search(&self, keyword: &str) -> Result<serde_json::Value, ProviderError> {
        self.get("symbol_search", keyword).await
    }

    async fn get(&self, endpoint: &str, symbol: &str) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);

        tracing::debug!(endpoint, symbol, "Querying stock data provider");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("apikey", &self.config.api_key)])
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status,
                message: extract_message(&body),
            });
        }

        Ok(body)
    }
}

/// Pull the provider's own error message out of a failure body
fn extract_message(body: &serde_json::Value) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("An error occurred.")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_message_from_body() {
        let body = json!({"code": 404, "message": "symbol not found", "status": "error"});
        assert_eq!(extract_message(&body), "symbol not found");
    }

    #[test]
    fn test_extract_message_fallback() {
        assert_eq!(extract_message(&json!({})), "An error occurred.");
        assert_eq!(extract_message(&json!({"message": 42})), "An error occurred.");
    }

    #[test]
    fn test_provider_config_redacted_debug() {
        let config = ProviderConfig {
            base_url: "https://api.twelvedata.com".to_string(),
            api_key: "secret789".to_string(),
            timeout: Duration::from_secs(10),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret789"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_surfaces_http_error() {
        let client = TwelveDataClient::new(ProviderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            timeout: Duration::from_millis(200),
        });

        let result = client.profile("AAPL").await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }
}
