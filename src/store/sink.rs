//! Worker-pooled persistence sink for flushed batches
//!
//! Writes run off the ingestion path on a bounded pool. A failed write
//! loses the whole batch: the loss is logged and counted, never retried.

use super::supabase::SupabaseClient;
use crate::feed::Tick;
use crate::ingest::Batch;
use crate::telemetry::{increment, CounterMetric};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::task::TaskTracker;

/// One row of the `price` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
    pub event: String,
    pub mic_code: Option<String>,
    pub day_volume: Option<u64>,
    pub updated_at: String,
}

impl PriceRecord {
    /// Build a storage record from a tick; the write timestamp is
    /// assigned here, not taken from the tick.
    pub fn from_tick(tick: &Tick, written_at: DateTime<Utc>) -> Self {
        Self {
            symbol: tick.symbol.clone(),
            price: tick.price.to_f64().unwrap_or(0.0),
            instrument_type: tick.instrument_type.clone(),
            event: tick.kind.as_str().to_string(),
            mic_code: tick.mic_code.clone(),
            day_volume: tick.day_volume,
            updated_at: written_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Sink write statistics
#[derive(Debug, Default, Clone)]
pub struct SinkStats {
    pub batches_stored: u64,
    pub batches_failed: u64,
    pub ticks_persisted: u64,
    pub ticks_dropped: u64,
}

/// Dispatches batches to the store on a bounded worker pool
#[derive(Clone)]
pub struct PriceSink {
    client: Arc<SupabaseClient>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    stats: Arc<RwLock<SinkStats>>,
}

impl PriceSink {
    /// Create a sink writing through the given client with `workers`
    /// concurrent inserts at most
    pub fn new(client: Arc<SupabaseClient>, workers: usize) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(workers)),
            tracker: TaskTracker::new(),
            stats: Arc::new(RwLock::new(SinkStats::default())),
        }
    }

    /// Hand a batch to the pool; never blocks the caller
    ///
    /// Empty batches are not dispatched. The batch moves into the write
    /// task by value and is dropped after the attempt.
    pub fn dispatch(&self, batch: Batch) {
        if batch.is_empty() {
            return;
        }

        let client = self.client.clone();
        let permits = self.permits.clone();
        let stats = self.stats.clone();

        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                // Pool closed during shutdown; the batch counts as dropped.
                tracing::warn!(batch_id = %batch.id, count = batch.len(), "Store pool closed, batch dropped");
                return;
            };

            let count = batch.len();
            let written_at = Utc::now();
            let records: Vec<PriceRecord> = batch
                .ticks
                .iter()
                .map(|tick| PriceRecord::from_tick(tick, written_at))
                .collect();

            match client.insert_prices(&records).await {
                Ok(()) => {
                    let mut s = stats.write().await;
                    s.batches_stored += 1;
                    s.ticks_persisted += count as u64;
                    drop(s);
                    increment(CounterMetric::BatchesStored, 1);
                    increment(CounterMetric::TicksPersisted, count as u64);
                    tracing::info!(batch_id = %batch.id, count, "Stored price batch");
                }
                Err(e) => {
                    // Accepted-loss policy: the batch is not retried or re-queued.
                    let mut s = stats.write().await;
                    s.batches_failed += 1;
                    s.ticks_dropped += count as u64;
                    drop(s);
                    increment(CounterMetric::BatchesFailed, 1);
                    increment(CounterMetric::TicksDropped, count as u64);
                    tracing::error!(
                        batch_id = %batch.id,
                        count,
                        error = %e,
                        "Failed to store price batch, batch lost"
                    );
                }
            }
        });
    }

    /// Stop accepting batches and wait for in-flight writes, bounded by `grace`
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                pending = self.tracker.len(),
                "Store writes still in flight after grace period"
            );
        }
    }

    /// Snapshot of write statistics
    pub async fn stats(&self) -> SinkStats {
        self.stats.read().await.clone()
    }
}
