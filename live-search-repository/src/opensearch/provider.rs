//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use live_search_shared::{FieldMap, RawResponse};
use opensearch::{
    http::{
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::BackendConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::get_index_settings;

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use live_search_repository::{BackendConfig, OpenSearchProvider, SearchIndexProvider};
///
/// let provider = OpenSearchProvider::from_config(&BackendConfig::default())?;
/// provider.ensure_index_exists("posts").await?;
///
/// let mut doc = serde_json::Map::new();
/// doc.insert("title".to_string(), "Hello".into());
/// // Replaces any document previously stored under this id
/// provider.upsert_document("posts", &doc, "abc123").await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the specified URL.
    ///
    /// No request is sent; the connection is established lazily.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Create a provider from a backend configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self, SearchIndexError> {
        Self::new(&config.url())
    }

    /// Turn a non-success response into an error built by `make_error`.
    ///
    /// Statuses listed in `accepted` are treated as success.
    async fn check_response(
        response: Response,
        accepted: &[u16],
        operation: &str,
        make_error: fn(String) -> SearchIndexError,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status_code();
        if status.is_success() || accepted.contains(&status.as_u16()) {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %error_body, operation = operation, "Request failed");
        Err(make_error(format!(
            "{} failed with status {}: {}",
            operation, status, error_body
        )))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Create the index with default settings unless it already exists.
    async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        Self::check_response(
            response,
            &[],
            "Index creation",
            SearchIndexError::IndexCreationError,
        )
        .await?;

        info!(index = %index, "Created index");
        Ok(())
    }

    /// Index a document under `id`, replacing any previous version entirely.
    async fn upsert_document(
        &self,
        index: &str,
        document: &FieldMap,
        id: &str,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        Self::check_response(response, &[], "Index", SearchIndexError::IndexError).await?;

        debug!(index = %index, id = %id, "Document indexed");
        Ok(())
    }

    /// Delete a document. A 404 is treated as success: the document is gone either way.
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        Self::check_response(response, &[404], "Delete", SearchIndexError::DeleteError).await?;

        debug!(index = %index, id = %id, "Document deleted");
        Ok(())
    }

    /// Run a search and return the response body as text.
    async fn search(
        &self,
        index: &str,
        query: &Map<String, Value>,
    ) -> Result<RawResponse, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(query)
            .send()
            .await
            .map_err(|e| SearchIndexError::search(e.to_string()))?;

        let response =
            Self::check_response(response, &[], "Search", SearchIndexError::SearchError).await?;

        let body = response
            .text()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        debug!(index = %index, bytes = body.len(), "Search completed");
        Ok(RawResponse::Text(body))
    }
}
