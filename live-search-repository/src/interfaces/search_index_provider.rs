//! Index backend trait definition.
//!
//! This module defines the abstract interface for index backend operations,
//! allowing for different implementations (OpenSearch, Elasticsearch, in-memory
//! test doubles, etc.).

use async_trait::async_trait;
use live_search_shared::{FieldMap, RawResponse};
use serde_json::{Map, Value};

use crate::errors::SearchIndexError;

/// Abstracts the underlying index backend.
///
/// Implementations are wrapped by `SearchIndexService` and shared between the
/// sync engine (writes) and the search path (reads).
///
/// # Note on Document Writes
///
/// `upsert_document` is a full replace: a later upsert with the same id
/// overwrites all earlier content. There is no partial update.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the given index exists, creating it with default settings if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If the check or creation fails
    async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Store `document` under `id`, replacing any existing document with that id.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index name
    /// * `document` - The complete document body
    /// * `id` - The document id
    async fn upsert_document(
        &self,
        index: &str,
        document: &FieldMap,
        id: &str,
    ) -> Result<(), SearchIndexError>;

    /// Delete the document stored under `id`.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchIndexError>;

    /// Execute a backend-native query against `index` and return the raw response.
    ///
    /// # Arguments
    ///
    /// * `index` - The index to search
    /// * `query` - The complete request body (query, size, aggregations, ...)
    ///
    /// # Returns
    ///
    /// * `Ok(RawResponse)` - The unshaped backend response
    /// * `Err(SearchIndexError)` - If the request fails or the backend rejects it
    async fn search(
        &self,
        index: &str,
        query: &Map<String, Value>,
    ) -> Result<RawResponse, SearchIndexError>;
}
