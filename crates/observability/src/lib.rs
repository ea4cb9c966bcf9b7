//! # Observability
//!
//! Logging and metrics bootstrap shared by every binary entry point.
//!
//! Logging uses `tracing` with an env-filter (`RUST_LOG` wins over the
//! configured default). Metrics go through the `metrics` facade; when a
//! port is configured a Prometheus scrape endpoint is installed.

pub mod metrics;

pub use metrics::{CameraSummary, RunSummary, WindowOutcome};

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Prometheus listen port; `None` disables the exporter
    pub metrics_port: Option<u16>,
}

/// Install the global tracing subscriber and, if configured, the
/// Prometheus exporter. Call once at process start.
pub fn init(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let default_filter = config.log_filter.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder
            .json()
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .init(),
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    metrics::describe();
    Ok(())
}

/// Install the Prometheus scrape endpoint on `0.0.0.0:{port}`.
///
/// For binaries that configure tracing themselves.
pub fn init_metrics_only(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("failed to install metrics exporter on port {port}"))?;
    tracing::info!(port, "metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
