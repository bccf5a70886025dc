//! `RecordBatchProcessor` for driving change batches through a handler.
//!
//! # Overview
//!
//! The transport delivers change events in batches. The processor applies
//! every event of a batch to one [`EntityChangeHandler`]:
//!
//! - strictly sequentially, in delivery order
//! - exactly one attempt per event
//! - a failing event is logged and counted, then the next one is attempted
//!
//! # Delivery Order
//!
//! Two modifications of the same entity overwrite the same document. Applying
//! them out of order would leave the older state in the index, so the
//! processor never runs records of one batch concurrently. Separate batches
//! (different shards, or the article and screening streams) may run in
//! parallel on the same processor.
//!
//! # Outcomes
//!
//! `process` resolves once every event has been attempted. It reports no
//! per-record results: outcomes are visible in the logs and in the
//! `index_sync_records_total{handler, outcome}` counter.
//!
//! ```text
//! batch: [e1, e2, e3]
//!          │   │   │
//!          ▼   ▼   ▼
//!     handle(e1) ─ ok
//!     handle(e2) ─ err ─▶ log + count, continue
//!     handle(e3) ─ ok
//! ```
//!
//! # Example
//!
//! ```ignore
//! let processor = RecordBatchProcessor::new(screening_handler);
//! processor.process(&events).await;
//! ```

use listing_sync_core::change::ChangeEvent;
use listing_sync_core::handler::EntityChangeHandler;
use metrics::{counter, histogram};
use std::time::Instant;

/// Counter of handled records, labelled by `handler` and `outcome`.
pub const RECORDS_METRIC: &str = "index_sync_records_total";
/// Histogram of per-record handling time, labelled by `handler`.
pub const RECORD_DURATION_METRIC: &str = "index_sync_record_duration_seconds";
/// Counter of processed batches, labelled by `handler`.
pub const BATCHES_METRIC: &str = "index_sync_batches_total";

/// Outcome label for a record applied without error.
pub const OUTCOME_APPLIED: &str = "applied";

/// Applies change batches to one entity handler, isolating per-record failures.
pub struct RecordBatchProcessor<H> {
    handler: H,
}

impl<H> RecordBatchProcessor<H>
where
    H: EntityChangeHandler,
{
    /// Create a processor for the given handler.
    #[must_use]
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The handler this processor drives.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Attempt every event of a batch, in order.
    ///
    /// Never fails: handler errors are logged with the event's entity id and
    /// kind, counted, and skipped.
    pub async fn process(&self, events: &[ChangeEvent]) {
        let handler = self.handler.name();
        counter!(BATCHES_METRIC, "handler" => handler).increment(1);
        tracing::debug!(handler, records = events.len(), "Processing change batch");

        let mut failed = 0_usize;
        for event in events {
            if !self.process_record(handler, event).await {
                failed += 1;
            }
        }

        tracing::info!(
            handler,
            records = events.len(),
            failed,
            "Change batch processed"
        );
    }

    /// Process a single record. Returns whether it was applied.
    async fn process_record(&self, handler: &'static str, event: &ChangeEvent) -> bool {
        let started = Instant::now();
        let result = self.handler.handle(event).await;
        histogram!(RECORD_DURATION_METRIC, "handler" => handler)
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                counter!(RECORDS_METRIC, "handler" => handler, "outcome" => OUTCOME_APPLIED)
                    .increment(1);
                true
            }
            Err(e) => {
                counter!(RECORDS_METRIC, "handler" => handler, "outcome" => e.kind()).increment(1);
                tracing::error!(
                    handler,
                    entity_id = %event.entity_id,
                    event_kind = %event.kind,
                    error_kind = e.kind(),
                    error = %e,
                    "Failed to apply change event"
                );
                // Continue with the next record
                false
            }
        }
    }
}
