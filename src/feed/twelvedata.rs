//! TwelveData WebSocket price feed implementation
//!
//! The handshake URL carries the API key and a single seed symbol; the
//! remaining symbols are subscribed with an explicit message once the
//! socket is open. Messages that are not well-formed price events are
//! dropped at the parse boundary.

use super::{EventKind, FeedConnection, FeedError, PriceFeed, SubscriptionSet, Tick};
use crate::telemetry::{increment, CounterMetric};
use crate::ws::{WsClient, WsConfig, WsConnection, WsMessage};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;

/// Feed connection configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// TwelveData API key
    pub api_key: String,
    /// WebSocket endpoint
    pub ws_url: String,
    /// Keep-alive ping interval
    pub ping_interval: Duration,
    /// Pong grace window
    pub pong_timeout: Duration,
}

impl From<&crate::config::FeedSettings> for FeedConfig {
    fn from(settings: &crate::config::FeedSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            ws_url: settings.ws_url.clone(),
            ping_interval: settings.ping_interval,
            pong_timeout: settings.pong_timeout,
        }
    }
}

/// Raw quote event as it appears on the wire
#[derive(Debug, Deserialize)]
struct RawQuoteEvent {
    event: String,
    symbol: Option<String>,
    price: Option<RawPrice>,
    #[serde(rename = "type")]
    instrument_type: Option<String>,
    mic_code: Option<String>,
    day_volume: Option<u64>,
}

/// Price field, sent either as a JSON number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Decimal::from_f64_retain(*n),
            Self::Text(s) => Decimal::from_str(s).ok(),
        }
    }
}

/// TwelveData WebSocket feed for exchange-qualified stock symbols
pub struct TwelveDataFeed {
    config: FeedConfig,
}

impl TwelveDataFeed {
    /// Create a new feed with the given configuration
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// Build the handshake URL seeded with the first symbol
    fn handshake_url(&self, seed: &str) -> String {
        format!(
            "{}?apikey={}&symbol={}",
            self.config.ws_url, self.config.api_key, seed
        )
    }

    /// Build the subscribe message for every symbol after the seed
    fn subscribe_message(symbols: &[String]) -> String {
        serde_json::json!({
            "action": "subscribe",
            "params": { "symbols": symbols.join(",") }
        })
        .to_string()
    }

    /// Parse a raw feed payload into a Tick
    ///
    /// Returns `None` for anything that is not a price event with a
    /// symbol and a usable price. Dropping here is not an error.
    fn parse_message(msg: &str) -> Option<Tick> {
        let event: RawQuoteEvent = serde_json::from_str(msg).ok()?;

        if event.event != "price" {
            return None;
        }

        let symbol = event.symbol?;
        let price = event.price?.to_decimal()?;

        Some(Tick {
            symbol,
            price,
            kind: EventKind::Price,
            instrument_type: event.instrument_type,
            mic_code: event.mic_code,
            day_volume: event.day_volume,
            received_at: Utc::now(),
        })
    }

    /// Forward parsed ticks from the socket until it closes
    async fn run_message_loop(mut conn: WsConnection, tick_tx: mpsc::Sender<Tick>) {
        while let Some(msg) = conn.recv().await {
            match msg {
                WsMessage::Text(text) => match Self::parse_message(&text) {
                    Some(tick) => {
                        if tick_tx.send(tick).await.is_err() {
                            tracing::debug!("Tick receiver dropped, stopping feed");
                            conn.close();
                            break;
                        }
                    }
                    None => {
                        increment(CounterMetric::TicksIgnored, 1);
                        tracing::debug!(payload = %text, "Ignoring unrecognized feed message");
                    }
                },
                WsMessage::Binary(_) => {
                    // The quote stream is text-only.
                }
            }
        }
        tracing::warn!("Feed message loop ended");
    }
}

#[async_trait]
impl PriceFeed for TwelveDataFeed {
    async fn open(&self, symbols: &SubscriptionSet) -> Result<FeedConnection, FeedError> {
        let seed = symbols.seed().ok_or(FeedError::EmptySubscription)?;

        tracing::info!(symbol_count = symbols.len(), seed, "Opening TwelveData feed");

        let ws_config = WsConfig::new(self.handshake_url(seed))
            .ping_interval(self.config.ping_interval)
            .pong_timeout(self.config.pong_timeout);

        let conn = WsClient::new(ws_config).connect().await?;

        let rest = symbols.rest();
        if !rest.is_empty() {
            if let Err(e) = conn.send_text(Self::subscribe_message(rest)).await {
                conn.close();
                return Err(FeedError::Subscribe(e.to_string()));
            }
        }

        let cancel = conn.cancel_token();
        let (tick_tx, tick_rx) = mpsc::channel(1024);

        tokio::spawn(async move {
            Self::run_message_loop(conn, tick_tx).await;
        });

        Ok(FeedConnection::new(tick_rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn feed() -> TwelveDataFeed {
        TwelveDataFeed::new(FeedConfig {
            api_key: "test-key".to_string(),
            ws_url: crate::config::DEFAULT_WS_URL.to_string(),
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        })
    }

    #[test]
    fn test_handshake_url() {
        let url = feed().handshake_url("AAPL:NASDAQ");
        assert_eq!(
            url,
            "wss://ws.twelvedata.com/v1/quotes/price?apikey=test-key&symbol=AAPL:NASDAQ"
        );
    }

    #[test]
    fn test_subscribe_message_shape() {
        let msg = TwelveDataFeed::subscribe_message(&[
            "TCS:NSE".to_string(),
            "RELIANCE:BSE".to_string(),
        ]);
        let value: serde_json::Value = serde_json::from_str(&msg).unwrap();

        assert_eq!(value["action"], "subscribe");
        assert_eq!(value["params"]["symbols"], "TCS:NSE,RELIANCE:BSE");
    }

    #[test]
    fn test_parse_valid_price_event() {
        let msg = r#"{
            "event": "price",
            "symbol": "TCS:NSE",
            "price": 3456.75,
            "type": "Common Stock",
            "mic_code": "XNSE",
            "day_volume": 120000
        }"#;

        let tick = TwelveDataFeed::parse_message(msg).unwrap();
        assert_eq!(tick.symbol, "TCS:NSE");
        assert_eq!(tick.price, dec!(3456.75));
        assert_eq!(tick.kind, EventKind::Price);
        assert_eq!(tick.instrument_type.as_deref(), Some("Common Stock"));
        assert_eq!(tick.mic_code.as_deref(), Some("XNSE"));
        assert_eq!(tick.day_volume, Some(120000));
    }

    #[test]
    fn test_parse_string_price() {
        let msg = r#"{"event":"price","symbol":"AAPL:NASDAQ","price":"12.5"}"#;
        let tick = TwelveDataFeed::parse_message(msg).unwrap();
        assert_eq!(tick.price, dec!(12.5));
    }

    #[test]
    fn test_parse_non_price_event_dropped() {
        let msg = r#"{"event":"subscribe-status","status":"ok"}"#;
        assert!(TwelveDataFeed::parse_message(msg).is_none());
    }

    #[test]
    fn test_parse_missing_symbol_dropped() {
        let msg = r#"{"event":"price","price":101.5}"#;
        assert!(TwelveDataFeed::parse_message(msg).is_none());
    }

    #[test]
    fn test_parse_missing_price_dropped() {
        let msg = r#"{"event":"price","symbol":"AAPL:NASDAQ"}"#;
        assert!(TwelveDataFeed::parse_message(msg).is_none());
    }

    #[test]
    fn test_parse_invalid_json_dropped() {
        assert!(TwelveDataFeed::parse_message("not valid json").is_none());
    }

    #[test]
    fn test_parse_unparseable_price_dropped() {
        let msg = r#"{"event":"price","symbol":"AAPL:NASDAQ","price":"abc"}"#;
        assert!(TwelveDataFeed::parse_message(msg).is_none());
    }
}
