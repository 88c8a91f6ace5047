//! Price feed types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Kind of feed event a tick was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A price update
    Price,
    /// Any other recognized payload
    Other,
}

impl EventKind {
    /// Wire name of the event kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Other => "other",
        }
    }
}

/// A single price tick from the feed
///
/// Constructed only at the parse boundary; immutable afterwards. The
/// receipt timestamp is assigned on arrival, never taken from the feed.
#[derive(Debug, Clone, Serialize)]
pub struct Tick {
    /// Exchange-qualified trading symbol (e.g., "TCS:NSE")
    pub symbol: String,
    /// Quoted price
    pub price: Decimal,
    /// Feed event kind
    pub kind: EventKind,
    /// Instrument type reported by the feed, if any
    pub instrument_type: Option<String>,
    /// Venue (MIC) code, if any
    pub mic_code: Option<String>,
    /// Cumulative day volume, if any
    pub day_volume: Option<u64>,
    /// Local timestamp when the tick was received
    pub received_at: DateTime<Utc>,
}

/// The fixed set of symbols one feed connection subscribes to
///
/// Order-preserving and de-duplicated. The first symbol seeds the
/// connection handshake; the rest go into the subscribe message.
#[derive(Debug, Clone)]
pub struct SubscriptionSet {
    symbols: Vec<String>,
}

impl SubscriptionSet {
    /// Build a subscription set, dropping duplicates but keeping order
    pub fn new(symbols: Vec<String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let symbols = symbols
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
        Self { symbols }
    }

    /// Number of symbols in the set
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The handshake seed symbol
    pub fn seed(&self) -> Option<&str> {
        self.symbols.first().map(String::as_str)
    }

    /// Every symbol after the seed
    pub fn rest(&self) -> &[String] {
        if self.symbols.is_empty() {
            &[]
        } else {
            &self.symbols[1..]
        }
    }

    /// All symbols in order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}
