//! Price feed module
//!
//! Real-time price ticks from the TwelveData quote WebSocket.

mod twelvedata;
mod types;

pub use twelvedata::{FeedConfig, TwelveDataFeed};
pub use types::{EventKind, SubscriptionSet, Tick};

use crate::ws::WsError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Feed errors
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The subscription set has no symbols
    #[error("empty subscription set")]
    EmptySubscription,
    /// Transport could not be established or was lost during the handshake
    #[error("feed connect failed: {0}")]
    Connect(#[from] WsError),
    /// The subscribe message could not be delivered
    #[error("subscribe failed: {0}")]
    Subscribe(String),
}

/// A live feed subscription
///
/// Ticks arrive in feed order; `next_tick` yields `None` once the
/// underlying connection is gone. `close` is idempotent.
pub struct FeedConnection {
    ticks: mpsc::Receiver<Tick>,
    cancel: CancellationToken,
}

impl FeedConnection {
    pub(crate) fn new(ticks: mpsc::Receiver<Tick>, cancel: CancellationToken) -> Self {
        Self { ticks, cancel }
    }

    /// Receive the next parsed tick
    pub async fn next_tick(&mut self) -> Option<Tick> {
        self.ticks.recv().await
    }

    /// Close the underlying connection; safe to call more than once
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Trait for push-based price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Open one connection subscribed to the given symbol set
    async fn open(&self, symbols: &SubscriptionSet) -> Result<FeedConnection, FeedError>;
}
