//! # Listing Sync Testing
//!
//! Testing utilities for the listing index synchronizer.
//!
//! This crate provides:
//! - [`InMemoryDocumentStore`]: search store fake with call recording and
//!   failure injection
//! - [`ScriptedHandler`]: handler with scripted per-entity outcomes
//! - [`fixtures`]: change image builders
//! - [`CapturedLogs`]: log capture for asserting on structured fields
//! - [`properties`]: proptest strategies for mixed-outcome batches
//!
//! ## Example
//!
//! ```ignore
//! use listing_sync_testing::{fixtures, InMemoryDocumentStore, StoreOperation};
//!
//! #[tokio::test]
//! async fn test_removal_survives_index_failure() {
//!     let store = Arc::new(InMemoryDocumentStore::new());
//!     store.fail_on(StoreOperation::DeleteIndex);
//!
//!     let processor = RecordBatchProcessor::new(screening_handler(&store));
//!     processor.process(&[ChangeEvent::remove("s1")]).await;
//!
//!     assert_eq!(store.calls_of(StoreOperation::DeleteDocument).len(), 1);
//! }
//! ```

pub mod fixtures;
pub mod handler_mocks;
pub mod logs;
pub mod store_mocks;

/// Property-based testing utilities using proptest.
pub mod properties {
    use crate::handler_mocks::ScriptedHandler;
    use listing_sync_core::change::{ChangeEvent, EventKind};
    use proptest::prelude::*;

    /// Planned outcome of one record in a generated batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PlannedOutcome {
        /// The record applies cleanly
        Applied,
        /// The record's store call fails
        StoreFailure,
        /// The record carries an unsupported event kind
        UnsupportedKind,
    }

    /// Strategy for a single planned outcome.
    pub fn planned_outcome() -> impl Strategy<Value = PlannedOutcome> {
        prop_oneof![
            3 => Just(PlannedOutcome::Applied),
            1 => Just(PlannedOutcome::StoreFailure),
            1 => Just(PlannedOutcome::UnsupportedKind),
        ]
    }

    /// Strategy for a batch of up to `max_len` planned outcomes.
    pub fn batch_plan(max_len: usize) -> impl Strategy<Value = Vec<PlannedOutcome>> {
        prop::collection::vec(planned_outcome(), 0..=max_len)
    }

    /// Entity id used for the record at `position`.
    #[must_use]
    pub fn entity_id(position: usize) -> String {
        format!("e{position}")
    }

    /// Build a scripted handler and the batch that realizes `plan` against it.
    #[must_use]
    pub fn scripted_batch(plan: &[PlannedOutcome]) -> (ScriptedHandler, Vec<ChangeEvent>) {
        let failing = plan
            .iter()
            .enumerate()
            .filter(|(_, outcome)| **outcome == PlannedOutcome::StoreFailure)
            .map(|(position, _)| entity_id(position));
        let handler = ScriptedHandler::failing_for(failing);

        let events = plan
            .iter()
            .enumerate()
            .map(|(position, outcome)| match outcome {
                PlannedOutcome::UnsupportedKind => {
                    ChangeEvent::new(EventKind::from("REPLACE"), entity_id(position))
                }
                PlannedOutcome::Applied | PlannedOutcome::StoreFailure => {
                    ChangeEvent::remove(entity_id(position))
                }
            })
            .collect();

        (handler, events)
    }
}

/// Install a test-writer tracing subscriber, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use handler_mocks::ScriptedHandler;
pub use logs::CapturedLogs;
pub use store_mocks::{InMemoryDocumentStore, StoreCall, StoreOperation};
