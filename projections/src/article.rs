//! Article change handler.

use listing_sync_core::change::{ChangeEvent, EventKind};
use listing_sync_core::decode::Article;
use listing_sync_core::error::{Result, SyncError};
use listing_sync_core::handler::{ArticleIndexMapper, EntityChangeHandler};
use listing_sync_core::store::DocumentStore;
use std::sync::Arc;

/// Keeps article documents in sync with the article stream.
///
/// - `INSERT` / `MODIFY`: decode the new image, map it, overwrite the document
/// - `REMOVE`: nothing; articles go away with their screening's dedicated index
/// - anything else: [`SyncError::UnsupportedEventKind`]
///
/// # Example
///
/// ```ignore
/// let handler = ArticleChangeHandler::new(
///     Arc::new(client),
///     ScreeningArticleMapper::new(PrefixedIndexNamer::default()),
/// );
/// handler.handle(&event).await?;
/// ```
pub struct ArticleChangeHandler<S, M> {
    store: Arc<S>,
    mapper: M,
}

impl<S, M> ArticleChangeHandler<S, M>
where
    S: DocumentStore,
    M: ArticleIndexMapper,
{
    /// Create an article handler.
    #[must_use]
    pub const fn new(store: Arc<S>, mapper: M) -> Self {
        Self { store, mapper }
    }

    async fn upsert(&self, event: &ChangeEvent) -> Result<()> {
        let article = Article::decode(event.after_image()?)?;
        let document = self.mapper.map_article(article)?;

        tracing::debug!(
            entity_id = %event.entity_id,
            index = %document.index_name,
            document_id = %document.document_id,
            "Overwriting article document"
        );
        self.store.overwrite_document(&document).await
    }
}

impl<S, M> EntityChangeHandler for ArticleChangeHandler<S, M>
where
    S: DocumentStore,
    M: ArticleIndexMapper,
{
    fn name(&self) -> &'static str {
        "articles"
    }

    async fn handle(&self, event: &ChangeEvent) -> Result<()> {
        match &event.kind {
            EventKind::Insert | EventKind::Modify => self.upsert(event).await,
            EventKind::Remove => {
                tracing::trace!(entity_id = %event.entity_id, "Ignoring article removal");
                Ok(())
            }
            EventKind::Unsupported(kind) => Err(SyncError::UnsupportedEventKind(kind.clone())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mapping::{PrefixedIndexNamer, ScreeningArticleMapper};
    use listing_sync_core::error::DecodeError;
    use listing_sync_testing::fixtures::article_image;
    use listing_sync_testing::{InMemoryDocumentStore, StoreCall, StoreOperation};

    fn handler(
        store: &Arc<InMemoryDocumentStore>,
    ) -> ArticleChangeHandler<InMemoryDocumentStore, ScreeningArticleMapper<PrefixedIndexNamer>>
    {
        ArticleChangeHandler::new(
            store.clone(),
            ScreeningArticleMapper::new(PrefixedIndexNamer::default()),
        )
    }

    #[tokio::test]
    async fn test_insert_and_modify_overwrite() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let handler = handler(&store);

        handler
            .handle(&ChangeEvent::insert("a1", article_image("a1", "s1", "first")))
            .await
            .unwrap();
        handler
            .handle(&ChangeEvent::modify("a1", article_image("a1", "s1", "second")))
            .await
            .unwrap();

        let document = store.document("screening-s1", "a1").unwrap();
        assert_eq!(document["title"], "second");
        assert_eq!(store.document_count("screening-s1"), 1);
        assert!(store
            .calls()
            .iter()
            .all(|call| matches!(call, StoreCall::OverwriteDocument { .. })));
    }

    #[tokio::test]
    async fn test_remove_is_noop() {
        let store = Arc::new(InMemoryDocumentStore::new());
        handler(&store)
            .handle(&ChangeEvent::remove("a1"))
            .await
            .unwrap();

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_after_image_is_decode_error() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let err = handler(&store)
            .handle(&ChangeEvent::new(EventKind::Insert, "a1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Decode(DecodeError::MissingImage { .. })
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_kind() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let event = ChangeEvent::new(EventKind::from("REPLACE"), "a1")
            .with_after_image(article_image("a1", "s1", "t"));

        let err = handler(&store).handle(&event).await.unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedEventKind(ref kind) if kind == "REPLACE"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.fail_on(StoreOperation::OverwriteDocument);

        let err = handler(&store)
            .handle(&ChangeEvent::insert("a1", article_image("a1", "s1", "t")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "store_operation_error");
    }
}
