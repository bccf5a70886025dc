//! Change handlers for the listing index synchronizer.
//!
//! # Overview
//!
//! This crate maps change events onto search index operations:
//! - **`ArticleChangeHandler`**: upserts article documents into their screening's index
//! - **`ScreeningChangeHandler`**: upserts screening list entries, and on removal
//!   deletes both the list entry and the screening's dedicated index
//! - **`IndexLifecycleManager`**: names and deletes dedicated screening indices
//! - **`RecordBatchProcessor`**: drives a batch through a handler, one record at a time
//!
//! # At-least-once Delivery
//!
//! Batches may be redelivered. Every operation issued here is an overwrite or a
//! delete, so replaying a batch converges to the same index state:
//!
//! ```text
//! INSERT s1 ─▶ overwrite screenings/s1   (replay: same document)
//! REMOVE s1 ─▶ delete screening-s1       (replay: already gone, ok)
//!           └▶ delete screenings/s1      (replay: already gone, ok)
//! ```
//!
//! # Wiring
//!
//! ```ignore
//! use listing_sync_projections::*;
//!
//! let store = Arc::new(client);
//! let namer = PrefixedIndexNamer::default();
//!
//! let articles = RecordBatchProcessor::new(ArticleChangeHandler::new(
//!     store.clone(),
//!     ScreeningArticleMapper::new(namer.clone()),
//! ));
//! let screenings = RecordBatchProcessor::new(ScreeningChangeHandler::new(
//!     store.clone(),
//!     IndexLifecycleManager::new(store, namer),
//! ));
//!
//! articles.process(&article_events).await;
//! screenings.process(&screening_events).await;
//! ```

pub mod article;
pub mod lifecycle;
pub mod mapping;
pub mod processor;
pub mod screening;

pub use article::ArticleChangeHandler;
pub use lifecycle::IndexLifecycleManager;
pub use mapping::{PrefixedIndexNamer, ScreeningArticleMapper};
pub use processor::RecordBatchProcessor;
pub use screening::ScreeningChangeHandler;
