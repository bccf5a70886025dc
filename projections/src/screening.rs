//! Screening change handler.
//!
//! Screenings are indexed twice over:
//!
//! - one entry in the shared list index (`screenings`), used by list queries
//! - one dedicated index per screening, holding that screening's articles
//!
//! Upserts only touch the list index. Removal cleans up both, as two
//! independent best-effort deletions:
//!
//! ```text
//! REMOVE s1
//!   ├─▶ delete index  screening-s1        (articles go with it)
//!   └─▶ delete doc    screenings/s1
//! ```
//!
//! A failure of one deletion never skips the other. The record only fails when
//! both do. Ids that cannot name a single index are rejected before either
//! deletion, and before any upsert.

use crate::lifecycle::IndexLifecycleManager;
use listing_sync_core::change::{ChangeEvent, EventKind};
use listing_sync_core::decode::Screening;
use listing_sync_core::error::{Result, SyncError};
use listing_sync_core::handler::{EntityChangeHandler, ScreeningIndexNamer};
use listing_sync_core::store::{DocumentStore, IndexAdmin, IndexDocument};
use metrics::counter;
use std::sync::Arc;

/// Default name of the shared screening list index.
pub const DEFAULT_SCREENINGS_INDEX: &str = "screenings";

/// Counter of failed steps during screening removal, labelled by `operation`.
pub const REMOVAL_STEP_FAILURES_METRIC: &str = "index_sync_removal_step_failures_total";

/// Keeps the screening list index and dedicated screening indices in sync.
pub struct ScreeningChangeHandler<S, A, N> {
    store: Arc<S>,
    lifecycle: IndexLifecycleManager<A, N>,
    list_index: String,
}

impl<S, A, N> ScreeningChangeHandler<S, A, N>
where
    S: DocumentStore,
    A: IndexAdmin,
    N: ScreeningIndexNamer,
{
    /// Create a screening handler writing to [`DEFAULT_SCREENINGS_INDEX`].
    #[must_use]
    pub fn new(store: Arc<S>, lifecycle: IndexLifecycleManager<A, N>) -> Self {
        Self {
            store,
            lifecycle,
            list_index: DEFAULT_SCREENINGS_INDEX.to_string(),
        }
    }

    /// Use a different shared list index.
    #[must_use]
    pub fn with_list_index(mut self, list_index: impl Into<String>) -> Self {
        self.list_index = list_index.into();
        self
    }

    /// Name of the shared list index.
    #[must_use]
    pub fn list_index(&self) -> &str {
        &self.list_index
    }

    async fn upsert(&self, screening_id: &str, event: &ChangeEvent) -> Result<()> {
        let screening = Screening::decode(screening_id, event.after_image()?)?;
        let document = IndexDocument::new(
            self.list_index.as_str(),
            screening_id,
            screening.into_document_body(),
        );

        tracing::debug!(
            entity_id = screening_id,
            index = %self.list_index,
            "Overwriting screening document"
        );
        self.store.overwrite_document(&document).await
    }

    async fn remove(&self, screening_id: &str) -> Result<()> {
        let index_result = self.lifecycle.delete_dedicated_index(screening_id).await;
        if let Err(e) = &index_result {
            log_step_failure(screening_id, "delete_dedicated_index", e);
        }

        let document_result = self
            .store
            .delete_document(&self.list_index, screening_id)
            .await;
        if let Err(e) = &document_result {
            log_step_failure(screening_id, "delete_list_document", e);
        }

        match (index_result, document_result) {
            (Err(index_error), Err(document_error)) => Err(SyncError::StoreOperation(format!(
                "screening {screening_id} removal failed: \
                 dedicated index deletion: {index_error}; \
                 list document deletion: {document_error}"
            ))),
            _ => Ok(()),
        }
    }
}

fn log_step_failure(screening_id: &str, operation: &'static str, error: &SyncError) {
    counter!(REMOVAL_STEP_FAILURES_METRIC, "operation" => operation).increment(1);
    tracing::error!(
        entity_id = %screening_id,
        operation = %operation,
        error = %error,
        "Screening removal step failed"
    );
}

impl<S, A, N> EntityChangeHandler for ScreeningChangeHandler<S, A, N>
where
    S: DocumentStore,
    A: IndexAdmin,
    N: ScreeningIndexNamer,
{
    fn name(&self) -> &'static str {
        "screenings"
    }

    async fn handle(&self, event: &ChangeEvent) -> Result<()> {
        if let EventKind::Unsupported(kind) = &event.kind {
            return Err(SyncError::UnsupportedEventKind(kind.clone()));
        }

        // An id that cannot name exactly one index never reaches the store.
        let screening_id = event.require_entity_id()?;
        self.lifecycle.dedicated_index_name(screening_id)?;

        match &event.kind {
            EventKind::Remove => self.remove(screening_id).await,
            _ => self.upsert(screening_id, event).await,
        }
    }
}
