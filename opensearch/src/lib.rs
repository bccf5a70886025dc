//! Search engine client for the listing index synchronizer.
//!
//! This crate provides [`OpenSearchClient`], an implementation of the
//! [`DocumentStore`](listing_sync_core::DocumentStore) and
//! [`IndexAdmin`](listing_sync_core::IndexAdmin) traits over the search
//! engine's REST API, using reqwest.
//!
//! # Idempotency
//!
//! Batches are delivered at least once, so every call must be safe to repeat.
//! The client treats "already there" on create and "already gone" on delete as
//! success. Overwrites use the index API, which creates or replaces.
//!
//! # Example
//!
//! ```no_run
//! use listing_sync_core::store::{DocumentStore, IndexAdmin, IndexDocument};
//! use listing_sync_opensearch::OpenSearchClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenSearchClient::new("http://localhost:9200")?;
//!
//! let document = IndexDocument::new("screenings", "s1", serde_json::Map::new());
//! client.overwrite_document(&document).await?;
//! client.delete_index("screening-s1").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;

pub use client::{OpenSearchClient, OpenSearchClientBuilder};
pub use error::OpenSearchError;
