//! Tests for batch processing through the real handlers

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use listing_sync_core::change::{ChangeEvent, EventKind};
use listing_sync_projections::{
    ArticleChangeHandler, IndexLifecycleManager, PrefixedIndexNamer, RecordBatchProcessor,
    ScreeningArticleMapper, ScreeningChangeHandler,
};
use listing_sync_testing::fixtures::{article_image, image, screening_image};
use listing_sync_testing::properties::{batch_plan, entity_id, scripted_batch, PlannedOutcome};
use listing_sync_testing::{init_test_tracing, InMemoryDocumentStore, StoreCall, StoreOperation};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

type ArticleProcessor = RecordBatchProcessor<
    ArticleChangeHandler<InMemoryDocumentStore, ScreeningArticleMapper<PrefixedIndexNamer>>,
>;
type ScreeningProcessor = RecordBatchProcessor<
    ScreeningChangeHandler<InMemoryDocumentStore, InMemoryDocumentStore, PrefixedIndexNamer>,
>;

fn article_processor(store: &Arc<InMemoryDocumentStore>) -> ArticleProcessor {
    init_test_tracing();
    RecordBatchProcessor::new(ArticleChangeHandler::new(
        store.clone(),
        ScreeningArticleMapper::new(PrefixedIndexNamer::default()),
    ))
}

fn screening_processor(store: &Arc<InMemoryDocumentStore>) -> ScreeningProcessor {
    init_test_tracing();
    RecordBatchProcessor::new(ScreeningChangeHandler::new(
        store.clone(),
        IndexLifecycleManager::new(store.clone(), PrefixedIndexNamer::default()),
    ))
}

fn valid_screening(id: &str) -> ChangeEvent {
    ChangeEvent::insert(
        id,
        screening_image(id, "2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z", "x"),
    )
}

#[tokio::test]
async fn test_malformed_article_does_not_block_next_record() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let events = vec![
        ChangeEvent::insert("a0", image(json!({"title": {"S": "no id"}}))),
        ChangeEvent::insert("a1", article_image("a1", "s1", "ok")),
    ];

    article_processor(&store).process(&events).await;

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        StoreCall::OverwriteDocument { index_name, document_id, .. }
            if index_name == "screening-s1" && document_id == "a1"
    ));
}

#[tokio::test]
async fn test_article_removal_touches_nothing() {
    let store = Arc::new(InMemoryDocumentStore::new());
    article_processor(&store)
        .process(&[ChangeEvent::remove("a1"), ChangeEvent::remove("a2")])
        .await;

    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_kind_leaves_other_records_alone() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let events = vec![
        valid_screening("s1"),
        ChangeEvent::new(EventKind::from("REPLACE"), "s2")
            .with_after_image(screening_image("s2", "2024-01-01", "2024-01-01", "y")),
        valid_screening("s3"),
    ];

    screening_processor(&store).process(&events).await;

    assert!(store.document("screenings", "s1").is_some());
    assert!(store.document("screenings", "s2").is_none());
    assert!(store.document("screenings", "s3").is_some());
}

#[tokio::test]
async fn test_partial_removal_failure_does_not_fail_batch() {
    let store = Arc::new(InMemoryDocumentStore::new());
    store.fail_on(StoreOperation::DeleteIndex);

    screening_processor(&store)
        .process(&[ChangeEvent::remove("s1"), valid_screening("s2")])
        .await;

    assert_eq!(
        store.calls_of(StoreOperation::DeleteDocument),
        vec![StoreCall::DeleteDocument {
            index_name: "screenings".to_string(),
            document_id: "s1".to_string()
        }]
    );
    assert!(store.document("screenings", "s2").is_some());
}

#[tokio::test]
async fn test_redelivered_batch_converges() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let processor = screening_processor(&store);
    let events = vec![
        valid_screening("s1"),
        valid_screening("s2"),
        ChangeEvent::remove("s2"),
    ];

    processor.process(&events).await;
    let first = (
        store.document("screenings", "s1"),
        store.document("screenings", "s2"),
    );
    processor.process(&events).await;

    assert_eq!(
        (
            store.document("screenings", "s1"),
            store.document("screenings", "s2")
        ),
        first
    );
    assert!(first.1.is_none());
}

#[tokio::test]
async fn test_later_modify_wins_within_batch() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let events = vec![
        ChangeEvent::insert("a1", article_image("a1", "s1", "v1")),
        ChangeEvent::modify("a1", article_image("a1", "s1", "v2")),
        ChangeEvent::modify("a1", article_image("a1", "s1", "v3")),
    ];

    article_processor(&store).process(&events).await;
    assert_eq!(store.document("screening-s1", "a1").unwrap()["title"], "v3");
}

#[tokio::test]
async fn test_concurrent_batches_share_handler() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let processor = screening_processor(&store);
    let left: Vec<_> = (0..10).map(|i| valid_screening(&format!("l{i}"))).collect();
    let right: Vec<_> = (0..10).map(|i| valid_screening(&format!("r{i}"))).collect();

    tokio::join!(processor.process(&left), processor.process(&right));
    assert_eq!(store.document_count("screenings"), 20);
}

proptest! {
    #[test]
    fn prop_every_record_attempted_exactly_once(plan in batch_plan(24)) {
        let (handler, events) = scripted_batch(&plan);
        let processor = RecordBatchProcessor::new(handler);
        tokio_test::block_on(processor.process(&events));

        let expected_attempts: Vec<_> = (0..plan.len()).map(entity_id).collect();
        prop_assert_eq!(processor.handler().attempts(), expected_attempts);

        let expected_applied: Vec<_> = plan
            .iter()
            .enumerate()
            .filter(|(_, outcome)| **outcome == PlannedOutcome::Applied)
            .map(|(position, _)| entity_id(position))
            .collect();
        prop_assert_eq!(processor.handler().applied(), expected_applied);
    }

    #[test]
    fn prop_successful_screenings_written_exactly_once(plan in batch_plan(16)) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let events: Vec<_> = plan
            .iter()
            .enumerate()
            .map(|(position, outcome)| {
                let id = entity_id(position);
                match outcome {
                    PlannedOutcome::Applied => valid_screening(&id),
                    PlannedOutcome::StoreFailure => ChangeEvent::insert(
                        id.as_str(),
                        image(json!({"createdAt": {"S": "never"}})),
                    ),
                    PlannedOutcome::UnsupportedKind => {
                        ChangeEvent::new(EventKind::from("REPLACE"), id)
                    }
                }
            })
            .collect();

        tokio_test::block_on(screening_processor(&store).process(&events));

        let written: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::OverwriteDocument { document_id, .. } => Some(document_id),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = plan
            .iter()
            .enumerate()
            .filter(|(_, outcome)| **outcome == PlannedOutcome::Applied)
            .map(|(position, _)| entity_id(position))
            .collect();
        prop_assert_eq!(written, expected);
    }
}
