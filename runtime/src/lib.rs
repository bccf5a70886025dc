//! # Listing Sync Runtime
//!
//! Runtime wiring for the listing index synchronizer.
//!
//! This crate turns configuration into a running pipeline: it builds the
//! search client, wires the article and screening handlers over it, and sets
//! up logging and metrics.
//!
//! ## Core Components
//!
//! - **`SyncConfig`**: sectioned, validated configuration from TOML or environment
//! - **`IndexSync`**: one batch processor per entity type over a shared store
//! - **`MetricsServer`**: Prometheus exporter for the `index_sync_*` metrics
//! - **`init_tracing`**: fmt subscriber driven by the configured log level
//!
//! ## Example
//!
//! ```no_run
//! use listing_sync_runtime::{init_tracing, IndexSync, MetricsServer, SyncConfig};
//!
//! # async fn example(payload: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_env()?;
//! init_tracing(&config.observability);
//!
//! let mut metrics = MetricsServer::new(config.observability.metrics_addr);
//! if config.observability.metrics_enabled {
//!     metrics.start()?;
//! }
//!
//! let sync = IndexSync::connect(&config)?;
//! let attempted = sync.process_article_payload(payload).await?;
//! tracing::info!(attempted, "Batch done");
//! # Ok(())
//! # }
//! ```

/// Configuration loading and validation
pub mod config;

/// Prometheus metrics for observability
pub mod metrics;

/// Handler wiring over a shared store
pub mod pipeline;

/// Tracing subscriber setup
pub mod telemetry;

/// Error types for runtime setup and payload intake
pub mod error {
    use crate::config::ConfigError;
    use crate::metrics::MetricsError;
    use listing_sync_opensearch::OpenSearchError;
    use thiserror::Error;

    /// Errors that can occur while starting the synchronizer or accepting a
    /// payload
    ///
    /// Failures of individual records are never surfaced here. The batch
    /// processor logs and counts them.
    #[derive(Error, Debug)]
    pub enum RuntimeError {
        /// Configuration could not be loaded
        #[error("Configuration error: {0}")]
        Config(#[from] ConfigError),

        /// The search client could not be built
        #[error("Search client error: {0}")]
        Client(#[from] OpenSearchError),

        /// The metrics exporter could not be started
        #[error("Metrics error: {0}")]
        Metrics(#[from] MetricsError),

        /// A transport payload was not a valid change batch
        ///
        /// Nothing in the payload was attempted.
        #[error("Malformed change batch: {0}")]
        Payload(#[from] serde_json::Error),
    }
}

pub use config::{ConfigError, SyncConfig};
pub use error::RuntimeError;
pub use metrics::{MetricsError, MetricsServer};
pub use pipeline::IndexSync;
pub use telemetry::init_tracing;
