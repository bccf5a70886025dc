//! Search engine REST client

use crate::error::OpenSearchError;
use listing_sync_core::decode::NormalizedEntity;
use listing_sync_core::error::{Result, SyncError};
use listing_sync_core::store::{DocumentStore, IndexAdmin, IndexDocument};
use reqwest::{Client, Method, StatusCode, Url};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Search engine client implementing [`DocumentStore`] and [`IndexAdmin`].
///
/// | Operation            | Request                    | Also succeeds on |
/// |----------------------|----------------------------|------------------|
/// | `create_document`    | `PUT /{index}/_create/{id}`| 409 Conflict     |
/// | `overwrite_document` | `PUT /{index}/_doc/{id}`   |                  |
/// | `delete_document`    | `DELETE /{index}/_doc/{id}`| 404 Not Found    |
/// | `delete_index`       | `DELETE /{index}`          | 404 Not Found    |
///
/// Index names and document ids are percent-encoded as path segments.
#[derive(Clone, Debug)]
pub struct OpenSearchClient {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl OpenSearchClient {
    /// Create a client for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError`] if the endpoint is not an http(s) base URL.
    pub fn new(endpoint: &str) -> std::result::Result<Self, OpenSearchError> {
        Self::builder().endpoint(endpoint).build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OpenSearchClientBuilder {
        OpenSearchClientBuilder::default()
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SyncError::StoreOperation(format!("endpoint {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request; 2xx and `tolerated` count as success.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&NormalizedEntity>,
        tolerated: Option<StatusCode>,
    ) -> Result<()> {
        let url = self.url(segments)?;
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            SyncError::StoreOperation(format!("{method} {} failed: {e}", url.path()))
        })?;

        let status = response.status();
        if status.is_success() || tolerated == Some(status) {
            tracing::trace!(%method, path = url.path(), %status, "Search request completed");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SyncError::StoreOperation(format!(
            "{method} {} returned {status}: {body}",
            url.path()
        )))
    }
}

impl DocumentStore for OpenSearchClient {
    async fn create_document(&self, document: &IndexDocument) -> Result<()> {
        self.send(
            Method::PUT,
            &[document.index_name.as_str(), "_create", document.document_id.as_str()],
            Some(&document.body),
            Some(StatusCode::CONFLICT),
        )
        .await
    }

    async fn overwrite_document(&self, document: &IndexDocument) -> Result<()> {
        self.send(
            Method::PUT,
            &[document.index_name.as_str(), "_doc", document.document_id.as_str()],
            Some(&document.body),
            None,
        )
        .await
    }

    async fn delete_document(&self, index_name: &str, document_id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &[index_name, "_doc", document_id],
            None,
            Some(StatusCode::NOT_FOUND),
        )
        .await
    }
}

impl IndexAdmin for OpenSearchClient {
    async fn delete_index(&self, index_name: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &[index_name],
            None,
            Some(StatusCode::NOT_FOUND),
        )
        .await
    }
}

/// Builder for [`OpenSearchClient`].
///
/// # Example
///
/// ```no_run
/// use listing_sync_opensearch::OpenSearchClient;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenSearchClient::builder()
///     .endpoint("https://search.internal:9200")
///     .basic_auth("indexer", "secret")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct OpenSearchClientBuilder {
    endpoint: Option<String>,
    credentials: Option<(String, String)>,
    timeout: Option<Duration>,
}

impl OpenSearchClientBuilder {
    /// Set the search endpoint (required).
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Authenticate every request with HTTP basic auth.
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`OpenSearchError`] if no endpoint is set, the endpoint is not an
    /// http(s) base URL, or the HTTP client cannot be built.
    pub fn build(self) -> std::result::Result<OpenSearchClient, OpenSearchError> {
        let endpoint = self.endpoint.ok_or(OpenSearchError::MissingEndpoint)?;
        let base_url = Url::parse(&endpoint).map_err(|e| OpenSearchError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(OpenSearchError::InvalidEndpoint {
                endpoint,
                reason: "expected an http or https URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| OpenSearchError::ClientBuild(e.to_string()))?;

        Ok(OpenSearchClient {
            client,
            base_url,
            credentials: self.credentials,
        })
    }
}
