//! Telemetry module
//!
//! Structured logging and Prometheus metrics.

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{increment, init_metrics_exporter, set_gauge, CounterMetric, GaugeMetric};

use crate::config::TelemetrySettings;

/// Initialize all telemetry subsystems
pub fn init_telemetry(settings: &TelemetrySettings) -> anyhow::Result<()> {
    init_logging(&settings.log_level)?;

    if settings.metrics_port > 0 {
        init_metrics_exporter(settings.metrics_port)?;
    }

    Ok(())
}
