//! Error types for building the search client

use thiserror::Error;

/// Errors that can occur while configuring an [`OpenSearchClient`](crate::OpenSearchClient).
///
/// Errors of individual store calls are reported as
/// [`SyncError::StoreOperation`](listing_sync_core::SyncError::StoreOperation).
#[derive(Debug, Error)]
pub enum OpenSearchError {
    /// No endpoint configured
    #[error("Missing search endpoint")]
    MissingEndpoint,

    /// Endpoint is not a usable base URL
    #[error("Invalid search endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}
