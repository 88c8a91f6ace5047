//! Bounded tick buffer with size and time flush triggers

use crate::feed::Tick;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// A drained, bounded group of ticks destined for one storage write
///
/// Owned exclusively from drain to the end of the write attempt; never
/// mutated after the hand-off.
#[derive(Debug)]
pub struct Batch {
    /// Correlation id for log and metric attribution
    pub id: Uuid,
    /// Ticks in arrival order
    pub ticks: Vec<Tick>,
}

impl Batch {
    /// Number of ticks in the batch
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

struct BufferInner {
    ticks: Vec<Tick>,
    last_flush: Instant,
}

/// Staging area for ticks awaiting flush
///
/// One mutex guards both mutation and draining, so the size trigger and
/// the time trigger can never drain the same contents twice. The buffer
/// never grows past `capacity`: the append that reaches it returns the
/// drained batch to the caller.
pub struct EventBuffer {
    inner: Mutex<BufferInner>,
    capacity: usize,
    timeout: Duration,
}

impl EventBuffer {
    /// Create a buffer with the given capacity and flush timeout
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                ticks: Vec::with_capacity(capacity),
                last_flush: Instant::now(),
            }),
            capacity,
            timeout,
        }
    }

    /// Configured capacity (the size trigger)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured flush timeout (the time trigger)
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append a tick; returns a batch when the buffer reaches capacity
    pub async fn append(&self, tick: Tick) -> Option<Batch> {
        let mut inner = self.inner.lock().await;
        inner.ticks.push(tick);

        if inner.ticks.len() >= self.capacity {
            Some(drain(&mut inner))
        } else {
            None
        }
    }

    /// Time-trigger check: drains a non-empty buffer whose contents have
    /// waited at least the flush timeout
    pub async fn sweep(&self) -> Option<Batch> {
        let mut inner = self.inner.lock().await;

        if inner.ticks.is_empty() || inner.last_flush.elapsed() < self.timeout {
            return None;
        }

        Some(drain(&mut inner))
    }

    /// Discard whatever is buffered, returning the dropped count
    ///
    /// Shutdown path only; the caller is expected to log the count so the
    /// loss stays observable.
    pub async fn discard(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let dropped = inner.ticks.len();
        inner.ticks.clear();
        dropped
    }

    /// Current number of buffered ticks
    pub async fn len(&self) -> usize {
        self.inner.lock().await.ticks.len()
    }

    /// Whether the buffer is currently empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn drain(inner: &mut BufferInner) -> Batch {
    inner.last_flush = Instant::now();
    Batch {
        id: Uuid::new_v4(),
        ticks: std::mem::take(&mut inner.ticks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::EventKind;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn tick(symbol: &str, price: i64) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            kind: EventKind::Price,
            instrument_type: None,
            mic_code: None,
            day_volume: None,
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_below_capacity_does_not_flush() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));

        for i in 0..49 {
            assert!(buffer.append(tick("AAPL:NASDAQ", i)).await.is_none());
        }

        assert_eq!(buffer.len().await, 49);
    }

    #[tokio::test]
    async fn test_append_at_capacity_flushes_once() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));

        let mut flushed = None;
        for i in 0..50 {
            if let Some(batch) = buffer.append(tick("AAPL:NASDAQ", i)).await {
                assert!(flushed.is_none(), "only the 50th append may flush");
                flushed = Some(batch);
            }
        }

        let batch = flushed.expect("the 50th append must flush");
        assert_eq!(batch.len(), 50);
        assert!(buffer.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_after_timeout_drains_in_order() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));

        for i in 0..10 {
            buffer.append(tick("TCS:NSE", i)).await;
        }

        tokio::time::advance(Duration::from_millis(1100)).await;

        let batch = buffer.sweep().await.expect("timed-out buffer must drain");
        assert_eq!(batch.len(), 10);
        let prices: Vec<Decimal> = batch.ticks.iter().map(|t| t.price).collect();
        let expected: Vec<Decimal> = (0..10).map(Decimal::from).collect();
        assert_eq!(prices, expected);
        assert!(buffer.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_before_timeout_is_noop() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));
        buffer.append(tick("TCS:NSE", 1)).await;

        tokio::time::advance(Duration::from_millis(500)).await;

        assert!(buffer.sweep().await.is_none());
        assert_eq!(buffer.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_empty_buffer_is_noop() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(buffer.sweep().await.is_none());
    }

    #[tokio::test]
    async fn test_discard_reports_dropped_count() {
        let buffer = EventBuffer::new(50, Duration::from_secs(1));
        for i in 0..7 {
            buffer.append(tick("AAPL:NASDAQ", i)).await;
        }

        assert_eq!(buffer.discard().await, 7);
        assert!(buffer.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_flush_resets_time_trigger() {
        let buffer = EventBuffer::new(2, Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;

        buffer.append(tick("AAPL:NASDAQ", 1)).await;
        let batch = buffer.append(tick("AAPL:NASDAQ", 2)).await;
        assert!(batch.is_some());

        // The size flush just reset the clock; a fresh tick is not stale.
        buffer.append(tick("AAPL:NASDAQ", 3)).await;
        assert!(buffer.sweep().await.is_none());
    }
}
