//! Prometheus metrics

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Price events accepted into the buffer
    TicksProcessed,
    /// Feed messages dropped at the parse boundary
    TicksIgnored,
    /// Batches drained from the buffer (either trigger)
    BatchesFlushed,
    /// Batches durably written
    BatchesStored,
    /// Batches lost to store failures
    BatchesFailed,
    /// Ticks durably written
    TicksPersisted,
    /// Ticks lost (store failure or shutdown residue)
    TicksDropped,
    /// Feed reconnection attempts
    Reconnects,
}

impl CounterMetric {
    const fn name(self) -> &'static str {
        match self {
            Self::TicksProcessed => "stockfeed_ticks_processed_total",
            Self::TicksIgnored => "stockfeed_ticks_ignored_total",
            Self::BatchesFlushed => "stockfeed_batches_flushed_total",
            Self::BatchesStored => "stockfeed_batches_stored_total",
            Self::BatchesFailed => "stockfeed_batches_failed_total",
            Self::TicksPersisted => "stockfeed_ticks_persisted_total",
            Self::TicksDropped => "stockfeed_ticks_dropped_total",
            Self::Reconnects => "stockfeed_reconnects_total",
        }
    }
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Feed connection state (0=disconnected 1=connecting 2=connected 3=closing)
    ConnectionState,
    /// Current buffered tick count
    BufferLen,
}

impl GaugeMetric {
    const fn name(self) -> &'static str {
        match self {
            Self::ConnectionState => "stockfeed_connection_state",
            Self::BufferLen => "stockfeed_buffer_len",
        }
    }
}

/// Increment a counter
pub fn increment(metric: CounterMetric, n: u64) {
    counter!(metric.name()).increment(n);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    gauge!(metric.name()).set(value);
}

/// Install the Prometheus exporter with an HTTP listener on the given port
pub fn init_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_metrics();
    tracing::info!(port, "Prometheus exporter listening");

    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        CounterMetric::TicksProcessed.name(),
        "Price events accepted into the buffer"
    );
    describe_counter!(
        CounterMetric::TicksIgnored.name(),
        "Feed messages dropped at the parse boundary"
    );
    describe_counter!(
        CounterMetric::BatchesFlushed.name(),
        "Batches drained from the buffer"
    );
    describe_counter!(CounterMetric::BatchesStored.name(), "Batches durably written");
    describe_counter!(
        CounterMetric::BatchesFailed.name(),
        "Batches lost to store failures"
    );
    describe_counter!(CounterMetric::TicksPersisted.name(), "Ticks durably written");
    describe_counter!(
        CounterMetric::TicksDropped.name(),
        "Ticks lost to store failures or shutdown"
    );
    describe_counter!(CounterMetric::Reconnects.name(), "Feed reconnection attempts");
    describe_gauge!(GaugeMetric::ConnectionState.name(), "Feed connection state");
    describe_gauge!(GaugeMetric::BufferLen.name(), "Current buffered tick count");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_names() {
        assert_eq!(
            CounterMetric::TicksProcessed.name(),
            "stockfeed_ticks_processed_total"
        );
        assert_eq!(
            CounterMetric::BatchesFailed.name(),
            "stockfeed_batches_failed_total"
        );
        assert_eq!(
            CounterMetric::TicksDropped.name(),
            "stockfeed_ticks_dropped_total"
        );
    }

    #[test]
    fn test_gauge_names() {
        assert_eq!(
            GaugeMetric::ConnectionState.name(),
            "stockfeed_connection_state"
        );
        assert_eq!(GaugeMetric::BufferLen.name(), "stockfeed_buffer_len");
    }
}
