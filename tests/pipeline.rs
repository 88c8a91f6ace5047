//! Ingestion pipeline integration tests

use chrono::Utc;
use tokio_test::assert_ok;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use stockfeed::feed::{EventKind, Tick};
use stockfeed::ingest::EventBuffer;
use stockfeed::store::{PriceSink, SupabaseClient, SupabaseConfig};

fn tick(symbol: &str, seq: i64) -> Tick {
    Tick {
        symbol: symbol.to_string(),
        price: Decimal::from(seq),
        kind: EventKind::Price,
        instrument_type: None,
        mic_code: None,
        day_volume: None,
        received_at: Utc::now(),
    }
}

fn unreachable_sink(workers: usize) -> PriceSink {
    let client = Arc::new(SupabaseClient::new(SupabaseConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_millis(200),
    }));
    PriceSink::new(client, workers)
}

/// A burst of 60 price events flushes a full batch on the 50th append and
/// the 10-tick remainder once the flush timeout elapses.
#[tokio::test(start_paused = true)]
async fn test_burst_flushes_full_batch_then_timed_remainder() {
    let buffer = EventBuffer::new(50, Duration::from_secs(1));

    let mut batches = Vec::new();
    for seq in 0..60 {
        // The whole burst lands within 0.2s of feed time.
        if seq % 20 == 0 {
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        if let Some(batch) = buffer.append(tick("AAPL:NASDAQ", seq)).await {
            batches.push(batch);
        }
    }

    assert_eq!(batches.len(), 1, "only the 50th append may flush");
    assert_eq!(batches[0].len(), 50);
    assert_eq!(buffer.len().await, 10);

    // No further appends; the remainder is not yet stale.
    assert!(buffer.sweep().await.is_none());

    tokio::time::advance(Duration::from_millis(1100)).await;

    let remainder = buffer.sweep().await.expect("remainder must flush on timeout");
    assert_eq!(remainder.len(), 10);
    let prices: Vec<Decimal> = remainder.ticks.iter().map(|t| t.price).collect();
    let expected: Vec<Decimal> = (50..60).map(Decimal::from).collect();
    assert_eq!(prices, expected, "remainder keeps arrival order");

    assert!(buffer.is_empty().await);
}

/// A failed store write loses only its own batch; the buffer keeps
/// accepting appends and later flushes are unaffected.
#[tokio::test]
async fn test_store_failure_does_not_stall_buffering() {
    let buffer = EventBuffer::new(5, Duration::from_secs(60));
    let sink = unreachable_sink(4);

    let mut first = None;
    for seq in 0..5 {
        if let Some(batch) = buffer.append(tick("TCS:NSE", seq)).await {
            first = Some(batch);
        }
    }
    sink.dispatch(first.expect("capacity reached"));

    // Buffering continues while the write is failing in the background.
    for seq in 5..8 {
        assert!(buffer.append(tick("TCS:NSE", seq)).await.is_none());
    }
    assert_eq!(buffer.len().await, 3);

    sink.shutdown(Duration::from_secs(5)).await;

    let stats = sink.stats().await;
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.ticks_dropped, 5);

    // A fresh batch still reaches the sink after the failure.
    let mut second = None;
    for seq in 8..10 {
        if let Some(batch) = buffer.append(tick("TCS:NSE", seq)).await {
            second = Some(batch);
        }
    }
    assert!(second.is_some());
    assert!(buffer.is_empty().await);
}

/// An empty buffer produces no batch, so the sink is never invoked.
#[tokio::test]
async fn test_empty_sweep_never_reaches_sink() {
    let buffer = EventBuffer::new(50, Duration::from_millis(10));
    let sink = unreachable_sink(4);

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(buffer.sweep().await.is_none());

    sink.shutdown(Duration::from_secs(1)).await;
    let stats = sink.stats().await;
    assert_eq!(stats.batches_stored, 0);
    assert_eq!(stats.batches_failed, 0);
}

/// Concurrent appends from a feed-style producer never overfill the
/// buffer and every tick ends up in exactly one batch.
#[tokio::test]
async fn test_concurrent_appends_partition_cleanly() {
    let buffer = Arc::new(EventBuffer::new(10, Duration::from_secs(60)));

    let mut handles = Vec::new();
    for worker in 0..4 {
        let buffer = buffer.clone();
        handles.push(tokio::spawn(async move {
            let mut drained = 0usize;
            for seq in 0..25 {
                if let Some(batch) = buffer.append(tick("RELIANCE:BSE", worker * 100 + seq)).await {
                    assert_eq!(batch.len(), 10, "size-triggered batches are exactly full");
                    drained += batch.len();
                }
            }
            drained
        }));
    }

    let mut drained = 0usize;
    for handle in handles {
        drained += assert_ok!(handle.await);
    }
    drained += buffer.discard().await;

    assert_eq!(drained, 100, "every appended tick is drained exactly once");
}
