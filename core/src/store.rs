//! Capabilities the synchronizer needs from the search engine.
//!
//! # Overview
//!
//! Handlers never talk to a concrete search client. They depend on two narrow
//! traits:
//!
//! - [`DocumentStore`]: document writes within an index
//! - [`IndexAdmin`]: whole-index administration
//!
//! Both must behave idempotently from the caller's point of view. Creating a
//! document that already exists, deleting a document that is gone, and deleting
//! an index that does not exist all succeed. This is what makes replaying an
//! at-least-once batch converge to the same index state.
//!
//! # Example
//!
//! ```ignore
//! let document = IndexDocument::new("screenings", "s1", body);
//! store.overwrite_document(&document).await?;
//! store.delete_document("screenings", "s1").await?;
//! store.delete_index("screening-s1").await?;
//! ```

use crate::decode::NormalizedEntity;
use crate::error::Result;
use std::future::Future;

/// Characters search engines reject in index names.
pub const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ':'];

/// Why `part` cannot appear in an index name, or `None` if it can.
///
/// Index names end up in request paths where `*` and `,` select several
/// indices at once, so ids that reach an index name must be checked first.
///
/// ```
/// use listing_sync_core::store::index_name_violation;
///
/// assert_eq!(index_name_violation("s1"), None);
/// assert!(index_name_violation("*").is_some());
/// assert!(index_name_violation("a,b").is_some());
/// ```
#[must_use]
pub fn index_name_violation(part: &str) -> Option<&'static str> {
    if part.is_empty() {
        Some("empty")
    } else if part.starts_with(['_', '-', '+']) {
        Some("starts with '_', '-' or '+'")
    } else if part.contains(FORBIDDEN_INDEX_CHARS) {
        Some("contains one of \\ / * ? \" < > | , # :")
    } else if part.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("contains whitespace or control characters")
    } else {
        None
    }
}

/// The unit applied to the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    /// Target index
    pub index_name: String,
    /// Document id within the index
    pub document_id: String,
    /// Document body
    pub body: NormalizedEntity,
}

impl IndexDocument {
    /// Create a new index document.
    pub fn new(
        index_name: impl Into<String>,
        document_id: impl Into<String>,
        body: NormalizedEntity,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            document_id: document_id.into(),
            body,
        }
    }
}

/// Document writes within an index.
pub trait DocumentStore: Send + Sync {
    /// Create a document if it does not exist yet.
    ///
    /// A document that already exists is left untouched and the call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StoreOperation`](crate::error::SyncError::StoreOperation)
    /// if the store call fails.
    fn create_document(&self, document: &IndexDocument) -> impl Future<Output = Result<()>> + Send;

    /// Create or fully replace a document.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StoreOperation`](crate::error::SyncError::StoreOperation)
    /// if the store call fails.
    fn overwrite_document(
        &self,
        document: &IndexDocument,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a document. Deleting an absent document succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StoreOperation`](crate::error::SyncError::StoreOperation)
    /// if the store call fails.
    fn delete_document(
        &self,
        index_name: &str,
        document_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Whole-index administration.
pub trait IndexAdmin: Send + Sync {
    /// Delete an index and every document in it. Deleting an absent index succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StoreOperation`](crate::error::SyncError::StoreOperation)
    /// if the store call fails.
    fn delete_index(&self, index_name: &str) -> impl Future<Output = Result<()>> + Send;
}
