//! Index backend service implementation.
//!
//! This module provides the service that application code uses to talk to the
//! index backend. It validates inputs and delegates to a `SearchIndexProvider`.

use std::sync::Arc;

use live_search_shared::{FieldMap, RawResponse};
use serde_json::{Map, Value};

use crate::config::BackendConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::utils::{validate_document_id, validate_index_name};

/// The main service for interacting with the index backend.
///
/// This is the high-level API that the sync engine and the search path use. It
/// provides input validation and delegates to a `SearchIndexProvider` for the
/// actual backend operations. The service also carries the `BackendConfig` the
/// provider was built from, so callers can consult settings such as `debug`.
///
/// # Example
///
/// ```no_run
/// use live_search_repository::{BackendConfig, OpenSearchProvider, SearchIndexService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BackendConfig::default();
/// let provider = OpenSearchProvider::from_config(&config)?;
/// let service = SearchIndexService::new(Box::new(provider), config);
///
/// let mut doc = serde_json::Map::new();
/// doc.insert("title".to_string(), "Hello".into());
/// service.upsert("posts", &doc, "abc123").await?;
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: BackendConfig,
}

impl SearchIndexService {
    /// Create a new service around a boxed provider.
    ///
    /// # Arguments
    ///
    /// * `provider` - A boxed implementation of `SearchIndexProvider` (e.g., `OpenSearchProvider`)
    /// * `config` - The configuration the provider was created from
    pub fn new(provider: Box<dyn SearchIndexProvider>, config: BackendConfig) -> Self {
        Self {
            provider: Arc::from(provider),
            config,
        }
    }

    /// Create a new service around a shared provider.
    pub fn from_shared(provider: Arc<dyn SearchIndexProvider>, config: BackendConfig) -> Self {
        Self { provider, config }
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Ensure `index` exists on the backend.
    pub async fn ensure_index(&self, index: &str) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        self.provider.ensure_index_exists(index).await
    }

    /// Store a complete document under `id`, replacing any earlier version.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(SearchIndexError::ValidationError)` - If the index name or id is invalid
    /// * `Err(SearchIndexError)` - If the backend rejects the write
    pub async fn upsert(
        &self,
        index: &str,
        document: &FieldMap,
        id: &str,
    ) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        validate_document_id(id)?;

        self.provider.upsert_document(index, document, id).await
    }

    /// Delete the document stored under `id`.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    pub async fn delete(&self, index: &str, id: &str) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        validate_document_id(id)?;

        self.provider.delete_document(index, id).await
    }

    /// Execute a backend-native query.
    pub async fn search(
        &self,
        index: &str,
        query: &Map<String, Value>,
    ) -> Result<RawResponse, SearchIndexError> {
        validate_index_name(index)?;

        self.provider.search(index, query).await
    }
}
