//! Supabase PostgREST client
//!
//! Two calls against the project's REST surface: reading the `stocks`
//! symbol table and bulk-inserting into the `price` table.

use super::sink::PriceRecord;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Exchanges whose symbols are ingested
const SUBSCRIBED_EXCHANGES: [&str; 2] = ["NSE", "BSE"];

/// Configuration for the Supabase client
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL
    pub base_url: String,
    /// API key (sent as both `apikey` and bearer token)
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl From<&crate::config::StoreSettings> for SupabaseConfig {
    fn from(settings: &crate::config::StoreSettings) -> Self {
        Self {
            base_url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
        }
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store answered with a non-success status
    #[error("store api error: {status} - {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// A row of the `stocks` table
#[derive(Debug, Clone, Deserialize)]
pub struct StockRow {
    pub symbol: String,
    pub exchange: String,
}

/// Client for the Supabase REST surface
pub struct SupabaseClient {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseClient {
    /// Create a new client
    pub fn new(config: SupabaseConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    /// Load the exchange-qualified subscription symbols from the `stocks` table
    ///
    /// Rows are filtered to the subscribed exchanges after the read and
    /// joined as `SYMBOL:EXCHANGE`.
    pub async fn fetch_symbols(&self) -> Result<Vec<String>, StoreError> {
        let url = self.table_url("stocks");

        tracing::debug!(url = %url, "Fetching symbols from store");

        let response = self
            .client
            .get(&url)
            .query(&[("select", "symbol,exchange")])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        let rows: Vec<StockRow> = response.json().await?;
        let symbols = qualify_symbols(&rows);

        tracing::info!(count = symbols.len(), "Fetched symbols from store");

        Ok(symbols)
    }

    /// Bulk-insert one batch of price records into the `price` table
    pub async fn insert_prices(&self, records: &[PriceRecord]) -> Result<(), StoreError> {
        let url = self.table_url("price");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        Ok(())
    }
}

/// Filter rows to the subscribed exchanges and join as `SYMBOL:EXCHANGE`
fn qualify_symbols(rows: &[StockRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| SUBSCRIBED_EXCHANGES.contains(&row.exchange.as_str()))
        .map(|row| format!("{}:{}", row.symbol, row.exchange))
        .collect()
}
