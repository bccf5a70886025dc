//! Entity change handlers and index mapping capabilities.
//!
//! One [`EntityChangeHandler`] exists per entity stream. The caller picks the
//! handler when wiring a stream to a batch processor; nothing in a handler
//! inspects which stream an event came from.
//!
//! The naming and mapping traits describe how entities land in the index. Their
//! implementations must be deterministic: the same input always yields the same
//! index name and document, which is what makes overwrites idempotent.

use crate::change::ChangeEvent;
use crate::decode::Article;
use crate::error::{DecodeError, Result};
use crate::store::IndexDocument;
use std::future::Future;

/// Maps one change event to zero or more index operations.
///
/// Handlers hold no mutable state, so one instance can be shared across
/// concurrently running batches.
///
/// # Example
///
/// ```ignore
/// impl EntityChangeHandler for ArticleChangeHandler<S, M> {
///     fn name(&self) -> &'static str {
///         "articles"
///     }
///
///     async fn handle(&self, event: &ChangeEvent) -> Result<()> {
///         match event.kind {
///             EventKind::Insert | EventKind::Modify => { /* overwrite */ Ok(()) }
///             EventKind::Remove => Ok(()),
///             EventKind::Unsupported(ref kind) => {
///                 Err(SyncError::UnsupportedEventKind(kind.clone()))
///             }
///         }
///     }
/// }
/// ```
pub trait EntityChangeHandler: Send + Sync {
    /// Handler name, used in logs and as a metrics label.
    fn name(&self) -> &'static str;

    /// Apply one change event to the index.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`](crate::error::SyncError) if the event is malformed,
    /// of an unsupported kind, or a store call fails.
    fn handle(&self, event: &ChangeEvent) -> impl Future<Output = Result<()>> + Send;
}

/// Derives the dedicated per-screening index name from a screening id.
pub trait ScreeningIndexNamer: Send + Sync {
    /// Name of the index that holds only this screening's documents.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidIndexId`] if the id would make the name
    /// address anything other than exactly one index.
    fn dedicated_index_name(&self, screening_id: &str) -> std::result::Result<String, DecodeError>;
}

/// Maps a normalized article to the document and index it is stored in.
pub trait ArticleIndexMapper: Send + Sync {
    /// Build the index document for an article.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the article lacks a field the mapping needs.
    fn map_article(&self, article: Article) -> std::result::Result<IndexDocument, DecodeError>;
}
