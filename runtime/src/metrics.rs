//! Prometheus metrics for observability and monitoring.
//!
//! Handlers and the batch processor record through the `metrics` facade; this
//! module installs the Prometheus recorder and describes every metric:
//! - `index_sync_batches_total{handler}`
//! - `index_sync_records_total{handler, outcome}`
//! - `index_sync_record_duration_seconds{handler}`
//! - `index_sync_removal_step_failures_total{operation}`
//!
//! # Example
//!
//! ```rust,no_run
//! use listing_sync_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Start metrics server on port 9090
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use listing_sync_projections::processor::{BATCHES_METRIC, RECORDS_METRIC, RECORD_DURATION_METRIC};
use listing_sync_projections::screening::REMOVAL_STEP_FAILURES_METRIC;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the global recorder and spawn the HTTP listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this logs a
    /// warning and leaves the existing recorder in place.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;
        let handle = recorder.handle();

        if let Err(e) = metrics::set_global_recorder(recorder) {
            let err_msg = e.to_string();
            if err_msg.contains("already initialized") {
                tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                return Ok(());
            }
            return Err(MetricsError::Install(err_msg));
        }

        let addr = self.addr;
        tokio::spawn(async move {
            if exporter.await.is_err() {
                tracing::error!(%addr, "Metrics listener stopped");
            }
        });

        self.handle = Some(handle);
        register_metrics();
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        BATCHES_METRIC,
        "Total number of change batches processed, by handler"
    );
    describe_counter!(
        RECORDS_METRIC,
        "Total number of change records processed, by handler and outcome"
    );
    describe_histogram!(
        RECORD_DURATION_METRIC,
        Unit::Seconds,
        "Time taken to apply a single change record"
    );
    describe_counter!(
        REMOVAL_STEP_FAILURES_METRIC,
        "Failed steps of screening removal, by operation"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use metrics::{counter, histogram};

    #[tokio::test]
    async fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[tokio::test]
    async fn test_metrics_server_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        counter!(RECORDS_METRIC, "handler" => "screenings", "outcome" => "applied").increment(1);
        counter!(REMOVAL_STEP_FAILURES_METRIC, "operation" => "delete_index").increment(1);
        histogram!(RECORD_DURATION_METRIC, "handler" => "screenings").record(0.02);

        // The recorder is process-global; only the first server gets a handle
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("index_sync_records_total"));
            assert!(rendered.contains("index_sync_removal_step_failures_total"));
            assert!(rendered.contains("index_sync_record_duration_seconds"));
        }
    }
}
