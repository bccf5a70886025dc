//! # Listing Sync Core
//!
//! Core types and traits for the listing index synchronizer.
//!
//! The synchronizer consumes ordered batches of change events from a primary
//! store and applies equivalent, idempotent operations to a search index, so
//! list and search queries can be served from the index.
//!
//! ## Core Concepts
//!
//! - **Change event**: one insert, modify or remove on a primary-store item
//! - **Attribute map**: the type-tagged wire encoding of an item image
//! - **Decoder**: pure conversion from attribute maps to normalized entities
//! - **Handler**: per-entity mapping from a change event to index operations
//! - **Store traits**: the document and index operations handlers depend on
//!
//! ## Architecture
//!
//! ```text
//! Transport batch
//!       │
//!       ▼
//! ┌───────────────────┐      ┌───────────────┐
//! │ Batch processor   │─────▶│ Entity handler│
//! └───────────────────┘      └──────┬────────┘
//!                                   │ decode + map
//!                                   ▼
//!                     ┌──────────────────────────┐
//!                     │ DocumentStore/IndexAdmin │
//!                     └──────────────────────────┘
//! ```

pub mod change;
pub mod decode;
pub mod error;
pub mod handler;
pub mod store;
pub mod stream;

pub use change::{AttributeMap, AttributeValue, ChangeEvent, EventKind};
pub use decode::{Article, NormalizedEntity, Screening};
pub use error::{DecodeError, Result, SyncError};
pub use handler::{ArticleIndexMapper, EntityChangeHandler, ScreeningIndexNamer};
pub use store::{DocumentStore, IndexAdmin, IndexDocument};
pub use stream::ChangeBatch;
