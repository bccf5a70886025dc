//! Wiring of both change handlers over one shared store.

use crate::config::{IndicesConfig, SearchConfig, SyncConfig};
use crate::error::RuntimeError;
use listing_sync_core::{ChangeBatch, ChangeEvent, DocumentStore, IndexAdmin};
use listing_sync_opensearch::{OpenSearchClient, OpenSearchError};
use listing_sync_projections::{
    ArticleChangeHandler, IndexLifecycleManager, PrefixedIndexNamer, RecordBatchProcessor,
    ScreeningArticleMapper, ScreeningChangeHandler,
};
use std::sync::Arc;

/// Article handler as wired by [`IndexSync`].
pub type ArticleHandler<S> = ArticleChangeHandler<S, ScreeningArticleMapper<PrefixedIndexNamer>>;

/// Screening handler as wired by [`IndexSync`].
pub type ScreeningHandler<S> = ScreeningChangeHandler<S, S, PrefixedIndexNamer>;

/// Entry point for the transport: one processor per entity type.
///
/// Handlers are built once and reused for every batch. Both processors share
/// the same store, so the index naming used when writing articles always
/// matches the naming used when a screening's index is deleted.
///
/// # Example
///
/// ```no_run
/// use listing_sync_runtime::{IndexSync, SyncConfig};
///
/// # async fn example(payload: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let config = SyncConfig::from_env()?;
/// let sync = IndexSync::connect(&config)?;
///
/// sync.process_screening_payload(payload).await?;
/// # Ok(())
/// # }
/// ```
pub struct IndexSync<S> {
    articles: RecordBatchProcessor<ArticleHandler<S>>,
    screenings: RecordBatchProcessor<ScreeningHandler<S>>,
}

impl<S> IndexSync<S>
where
    S: DocumentStore + IndexAdmin,
{
    /// Wire both handlers over `store` using the configured index names.
    #[must_use]
    pub fn new(store: Arc<S>, indices: &IndicesConfig) -> Self {
        let namer = PrefixedIndexNamer::new(indices.screening_index_prefix.clone());

        let articles = ArticleChangeHandler::new(
            Arc::clone(&store),
            ScreeningArticleMapper::with_screening_field(
                namer.clone(),
                indices.article_screening_field.clone(),
            ),
        );
        let screenings = ScreeningChangeHandler::new(
            Arc::clone(&store),
            IndexLifecycleManager::new(store, namer),
        )
        .with_list_index(indices.screenings_index.clone());

        Self {
            articles: RecordBatchProcessor::new(articles),
            screenings: RecordBatchProcessor::new(screenings),
        }
    }

    /// Apply a batch of article change events.
    pub async fn process_articles(&self, events: &[ChangeEvent]) {
        self.articles.process(events).await;
    }

    /// Apply a batch of screening change events.
    pub async fn process_screenings(&self, events: &[ChangeEvent]) {
        self.screenings.process(events).await;
    }

    /// Parse a stream envelope and apply it as article changes.
    ///
    /// Returns the number of records attempted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Payload`] if the envelope cannot be parsed, in
    /// which case no record was attempted.
    pub async fn process_article_payload(&self, payload: &str) -> Result<usize, RuntimeError> {
        let events = parse_payload("articles", payload)?;
        self.process_articles(&events).await;
        Ok(events.len())
    }

    /// Parse a stream envelope and apply it as screening changes.
    ///
    /// Returns the number of records attempted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Payload`] if the envelope cannot be parsed, in
    /// which case no record was attempted.
    pub async fn process_screening_payload(&self, payload: &str) -> Result<usize, RuntimeError> {
        let events = parse_payload("screenings", payload)?;
        self.process_screenings(&events).await;
        Ok(events.len())
    }
}

impl IndexSync<OpenSearchClient> {
    /// Build the search client from `config` and wire both handlers over it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Client`] if the search client cannot be built.
    pub fn connect(config: &SyncConfig) -> Result<Self, RuntimeError> {
        let client = search_client(&config.search)?;
        tracing::info!(
            endpoint = %client.base_url(),
            screenings_index = %config.indices.screenings_index,
            screening_index_prefix = %config.indices.screening_index_prefix,
            "Index sync wired"
        );
        Ok(Self::new(Arc::new(client), &config.indices))
    }
}

/// Build a search client from connection settings.
///
/// # Errors
///
/// Returns [`OpenSearchError`] if the endpoint is unusable.
pub fn search_client(config: &SearchConfig) -> Result<OpenSearchClient, OpenSearchError> {
    let mut builder = OpenSearchClient::builder()
        .endpoint(config.endpoint.clone())
        .timeout(config.timeout());
    if let Some((username, password)) = config.credentials() {
        builder = builder.basic_auth(username, password);
    }
    builder.build()
}

fn parse_payload(handler: &'static str, payload: &str) -> Result<Vec<ChangeEvent>, RuntimeError> {
    let batch = ChangeBatch::from_json(payload).map_err(|e| {
        tracing::error!(handler, error = %e, "Rejected malformed change batch");
        RuntimeError::Payload(e)
    })?;
    Ok(batch.into_events())
}
