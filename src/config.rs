//! Configuration loaded from environment variables
//!
//! Secrets come from the process environment (optionally seeded from a
//! `.env` file); tunables all have defaults and can be overridden with
//! `STOCKFEED_*` variables.

use std::net::SocketAddr;
use std::time::Duration;

/// TwelveData WebSocket quote endpoint.
pub const DEFAULT_WS_URL: &str = "wss://ws.twelvedata.com/v1/quotes/price";

/// TwelveData REST API base URL.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.twelvedata.com";

/// Root configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedSettings,
    pub store: StoreSettings,
    pub ingest: IngestSettings,
    pub api: ApiSettings,
    pub telemetry: TelemetrySettings,
}

/// Price feed connection settings
#[derive(Clone)]
pub struct FeedSettings {
    /// TwelveData API key
    pub api_key: String,
    /// WebSocket endpoint for the price quote stream
    pub ws_url: String,
    /// Keep-alive ping interval
    pub ping_interval: Duration,
    /// Grace window for the pong response before the connection is torn down
    pub pong_timeout: Duration,
}

impl std::fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSettings")
            .field("api_key", &"[REDACTED]")
            .field("ws_url", &self.ws_url)
            .field("ping_interval", &self.ping_interval)
            .field("pong_timeout", &self.pong_timeout)
            .finish()
    }
}

/// Persistent store (Supabase PostgREST) settings
#[derive(Clone)]
pub struct StoreSettings {
    /// Supabase project URL
    pub url: String,
    /// Supabase API key
    pub api_key: String,
    /// Request timeout for store calls
    pub timeout: Duration,
    /// Number of concurrent bulk-insert workers
    pub workers: usize,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("workers", &self.workers)
            .finish()
    }
}

/// Batching and supervision settings for the ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Buffer capacity; reaching it triggers an immediate flush
    pub batch_size: usize,
    /// Maximum age of buffered ticks before a timed flush
    pub batch_timeout: Duration,
    /// Cadence for publishing connection liveness and stats
    pub liveness_interval: Duration,
    /// Initial reconnect delay
    pub reconnect_initial: Duration,
    /// Reconnect delay cap
    pub reconnect_max: Duration,
    /// How long shutdown waits for in-flight store writes
    pub shutdown_grace: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_timeout: Duration::from_secs(1),
            liveness_interval: Duration::from_secs(1),
            reconnect_initial: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// HTTP API settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Socket address the API server binds to
    pub bind_addr: SocketAddr,
    /// TwelveData REST base URL for profile/search pass-through
    pub provider_url: String,
    /// Request timeout for provider calls
    pub provider_timeout: Duration,
}

/// Telemetry settings
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Prometheus exporter port (0 = disabled)
    pub metrics_port: u16,
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("missing required environment variable: {0}")]
    MissingVar(String),
    /// Environment variable has an empty value
    #[error("environment variable {0} cannot be empty")]
    EmptyVar(String),
    /// Environment variable holds an unparseable value
    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
    /// The stocks table yielded no symbols to subscribe to
    #[error("no symbols to subscribe to")]
    NoSymbols,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let feed = FeedSettings {
            api_key: require_env("TWELVEDATA_API_KEY")?,
            ws_url: env_or("STOCKFEED_WS_URL", DEFAULT_WS_URL),
            ping_interval: parse_env_duration_secs("STOCKFEED_PING_INTERVAL_SECS", 30),
            pong_timeout: parse_env_duration_secs("STOCKFEED_PONG_TIMEOUT_SECS", 10),
        };

        let store = StoreSettings {
            url: require_env("SUPABASE_URL")?,
            api_key: require_env("SUPABASE_KEY")?,
            timeout: parse_env_duration_secs("STOCKFEED_STORE_TIMEOUT_SECS", 10),
            workers: parse_env_usize("STOCKFEED_STORE_WORKERS", 4),
        };

        let defaults = IngestSettings::default();
        let ingest = IngestSettings {
            batch_size: parse_env_usize("STOCKFEED_BATCH_SIZE", defaults.batch_size),
            batch_timeout: parse_env_duration_millis("STOCKFEED_BATCH_TIMEOUT_MS", 1000),
            liveness_interval: defaults.liveness_interval,
            reconnect_initial: parse_env_duration_millis("STOCKFEED_RECONNECT_INITIAL_MS", 1000),
            reconnect_max: parse_env_duration_secs("STOCKFEED_RECONNECT_MAX_SECS", 30),
            shutdown_grace: parse_env_duration_secs("STOCKFEED_SHUTDOWN_GRACE_SECS", 5),
        };

        let api = ApiSettings {
            bind_addr: parse_env_addr("STOCKFEED_BIND_ADDR", "0.0.0.0:8000")?,
            provider_url: env_or("STOCKFEED_PROVIDER_URL", DEFAULT_PROVIDER_URL),
            provider_timeout: parse_env_duration_secs("STOCKFEED_PROVIDER_TIMEOUT_SECS", 10),
        };

        let telemetry = TelemetrySettings {
            log_level: env_or("STOCKFEED_LOG_LEVEL", "info"),
            metrics_port: parse_env_u16("STOCKFEED_METRICS_PORT", 0),
        };

        Ok(Self {
            feed,
            store,
            ingest,
            api,
            telemetry,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    let value = std::env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::EmptyVar(key.to_string()));
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default_secs: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(Duration::from_secs(default_secs), Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default_millis: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(Duration::from_millis(default_millis), Duration::from_millis)
}

fn parse_env_addr(key: &str, default: &str) -> Result<SocketAddr, ConfigError> {
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
    })
}
