//! Lifecycle of dedicated per-screening indices.

use listing_sync_core::error::{DecodeError, Result};
use listing_sync_core::handler::ScreeningIndexNamer;
use listing_sync_core::store::IndexAdmin;
use std::sync::Arc;

/// Derives dedicated index names and deletes those indices.
///
/// Every screening owns one index holding its articles. Deleting that index is
/// how a screening's articles leave the search engine.
pub struct IndexLifecycleManager<A, N> {
    admin: Arc<A>,
    namer: N,
}

impl<A, N> IndexLifecycleManager<A, N>
where
    A: IndexAdmin,
    N: ScreeningIndexNamer,
{
    /// Create a lifecycle manager.
    #[must_use]
    pub const fn new(admin: Arc<A>, namer: N) -> Self {
        Self { admin, namer }
    }

    /// Name of the dedicated index for a screening.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidIndexId`] if the id cannot name an index.
    pub fn dedicated_index_name(&self, screening_id: &str) -> std::result::Result<String, DecodeError> {
        self.namer.dedicated_index_name(screening_id)
    }

    /// Delete the dedicated index for a screening.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`](listing_sync_core::SyncError::Decode) without
    /// calling the index admin if the id cannot name an index, and
    /// [`SyncError::StoreOperation`](listing_sync_core::SyncError::StoreOperation)
    /// if the index admin call fails. An index that does not exist is not an error.
    pub async fn delete_dedicated_index(&self, screening_id: &str) -> Result<()> {
        let index_name = self.dedicated_index_name(screening_id)?;
        tracing::debug!(
            screening_id,
            index = %index_name,
            "Deleting dedicated screening index"
        );
        self.admin.delete_index(&index_name).await
    }
}
