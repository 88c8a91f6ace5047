//! Ingestion lifecycle supervision
//!
//! Loads the subscription set, owns the connection state machine,
//! reopens the feed with bounded exponential backoff, and runs the
//! timed-flush sweeper. Shutdown discards any buffered residue (the
//! count is logged) and gives in-flight store writes a bounded grace.

use super::buffer::EventBuffer;
use crate::config::{Config, ConfigError};
use crate::feed::{FeedConfig, FeedConnection, PriceFeed, SubscriptionSet, Tick, TwelveDataFeed};
use crate::store::{PriceSink, SinkStats, SupabaseClient, SupabaseConfig};
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Feed connection state, owned solely by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    /// State name for logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        }
    }

    /// Numeric encoding for the state gauge
    pub const fn gauge_value(&self) -> f64 {
        match self {
            Self::Disconnected => 0.0,
            Self::Connecting => 1.0,
            Self::Connected => 2.0,
            Self::Closing => 3.0,
        }
    }
}

/// Pipeline statistics
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub ticks_processed: u64,
    pub batches_flushed: u64,
    pub reconnect_attempts: u64,
}

/// Owns the feed connection lifecycle and coordinates buffer, sweeper and sink
pub struct IngestionSupervisor {
    feed: TwelveDataFeed,
    store: Arc<SupabaseClient>,
    sink: PriceSink,
    buffer: Arc<EventBuffer>,
    liveness_interval: Duration,
    reconnect_initial: Duration,
    reconnect_max: Duration,
    shutdown_grace: Duration,
    state: ConnectionState,
    stats: Arc<RwLock<IngestStats>>,
}

impl IngestionSupervisor {
    /// Wire up the pipeline from configuration
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(SupabaseClient::new(SupabaseConfig::from(&config.store)));
        let sink = PriceSink::new(store.clone(), config.store.workers);
        let buffer = Arc::new(EventBuffer::new(
            config.ingest.batch_size,
            config.ingest.batch_timeout,
        ));
        let feed = TwelveDataFeed::new(FeedConfig::from(&config.feed));

        Self {
            feed,
            store,
            sink,
            buffer,
            liveness_interval: config.ingest.liveness_interval,
            reconnect_initial: config.ingest.reconnect_initial,
            reconnect_max: config.ingest.reconnect_max,
            shutdown_grace: config.ingest.shutdown_grace,
            state: ConnectionState::Disconnected,
            stats: Arc::new(RwLock::new(IngestStats::default())),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Snapshot of pipeline statistics
    pub async fn stats(&self) -> IngestStats {
        self.stats.read().await.clone()
    }

    /// Snapshot of sink write statistics
    pub async fn sink_stats(&self) -> SinkStats {
        self.sink.stats().await
    }

    /// Run the pipeline until `shutdown` fires
    ///
    /// Fails fast, before any connection attempt, when the symbol set
    /// cannot be loaded or is empty.
    pub async fn run(mut self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let symbols = self
            .store
            .fetch_symbols()
            .await
            .context("failed to load subscription symbols")?;
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols.into());
        }
        let subscription = SubscriptionSet::new(symbols);

        tracing::info!(
            symbols = subscription.len(),
            batch_size = self.buffer.capacity(),
            batch_timeout = ?self.buffer.timeout(),
            "Ingestion pipeline starting"
        );

        let sweeper = tokio::spawn(run_sweeper(
            self.buffer.clone(),
            self.sink.clone(),
            self.stats.clone(),
            sweep_cadence(self.buffer.timeout()),
            shutdown.clone(),
        ));

        let mut backoff = self.reconnect_initial;

        while !shutdown.is_cancelled() {
            self.set_state(ConnectionState::Connecting);

            match self.feed.open(&subscription).await {
                Ok(mut conn) => {
                    self.set_state(ConnectionState::Connected);
                    backoff = self.reconnect_initial;

                    self.pump(&mut conn, &shutdown).await;

                    if shutdown.is_cancelled() {
                        self.set_state(ConnectionState::Closing);
                        conn.close();
                        break;
                    }

                    self.set_state(ConnectionState::Disconnected);
                    tracing::warn!("Feed disconnected, reconnecting");
                }
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    tracing::warn!(error = %e, "Feed open failed, retrying");
                }
            }

            increment(CounterMetric::Reconnects, 1);
            self.stats.write().await.reconnect_attempts += 1;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = next_backoff(backoff, self.reconnect_max);
        }

        let _ = sweeper.await;

        // Buffered residue is not flushed on shutdown; log the loss.
        let dropped = self.buffer.discard().await;
        if dropped > 0 {
            increment(CounterMetric::TicksDropped, dropped as u64);
            tracing::warn!(dropped, "Discarded buffered ticks at shutdown");
        }

        self.sink.shutdown(self.shutdown_grace).await;
        self.set_state(ConnectionState::Disconnected);

        let stats = self.stats().await;
        tracing::info!(
            ticks_processed = stats.ticks_processed,
            batches_flushed = stats.batches_flushed,
            reconnect_attempts = stats.reconnect_attempts,
            "Ingestion pipeline stopped"
        );

        Ok(())
    }

    /// Drive one connection until it ends or shutdown fires
    async fn pump(&mut self, conn: &mut FeedConnection, shutdown: &CancellationToken) {
        let mut liveness = tokio::time::interval(self.liveness_interval);
        liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,

                tick = conn.next_tick() => {
                    match tick {
                        Some(tick) => self.handle_tick(tick).await,
                        None => return,
                    }
                }

                _ = liveness.tick() => {
                    self.publish_liveness().await;
                }
            }
        }
    }

    async fn handle_tick(&mut self, tick: Tick) {
        increment(CounterMetric::TicksProcessed, 1);
        let processed = {
            let mut s = self.stats.write().await;
            s.ticks_processed += 1;
            s.ticks_processed
        };

        if processed % 100 == 0 {
            tracing::info!(processed, "Processed price updates");
        }

        if let Some(batch) = self.buffer.append(tick).await {
            increment(CounterMetric::BatchesFlushed, 1);
            self.stats.write().await.batches_flushed += 1;
            tracing::debug!(batch_id = %batch.id, count = batch.len(), "Buffer full, flushing");
            self.sink.dispatch(batch);
        }
    }

    async fn publish_liveness(&self) {
        set_gauge(GaugeMetric::ConnectionState, self.state.gauge_value());
        set_gauge(GaugeMetric::BufferLen, self.buffer.len().await as f64);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            tracing::debug!(from = self.state.as_str(), to = state.as_str(), "Connection state");
        }
        self.state = state;
        set_gauge(GaugeMetric::ConnectionState, state.gauge_value());
    }
}

/// Periodic time-trigger check for the buffer
async fn run_sweeper(
    buffer: Arc<EventBuffer>,
    sink: PriceSink,
    stats: Arc<RwLock<IngestStats>>,
    cadence: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            _ = ticker.tick() => {
                if let Some(batch) = buffer.sweep().await {
                    increment(CounterMetric::BatchesFlushed, 1);
                    stats.write().await.batches_flushed += 1;
                    tracing::debug!(batch_id = %batch.id, count = batch.len(), "Flush timeout elapsed, flushing");
                    sink.dispatch(batch);
                }
            }
        }
    }
}

/// Sweep often enough that a timed-out remainder flushes promptly
fn sweep_cadence(timeout: Duration) -> Duration {
    (timeout / 4).max(Duration::from_millis(10))
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
