//! The search service facade.
//!
//! `SearchService` owns the index registry, the sync engine, the backend client
//! and the process-wide conditions. It is the surface application code talks to:
//! registering indexes, searching them and mutating their properties.

use std::collections::HashMap;
use std::sync::Arc;

use live_search_repository::{
    BackendConfig, BackendConfigUpdate, OpenSearchProvider, SearchIndexProvider,
    SearchIndexService,
};
use live_search_shared::{
    FacetDefinition, FacetSpec, FilterDefinition, RawResponse, SearchRequest, SearchResult,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::conditions::{Conditions, ConditionsUpdate};
use crate::errors::SyncError;
use crate::query::{AssembledQuery, QueryAssembler};
use crate::registry::{IndexDefinition, IndexOptions, IndexRegistry};
use crate::shaper::shape;
use crate::sync::{BackendSlot, SyncEngine, SyncHandle, SyncStats};

/// Entry point for registering, searching and mutating indexes.
///
/// Cloning the service yields another handle to the same state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use live_search::feed::MemoryCollection;
/// use live_search::registry::IndexOptions;
/// use live_search::service::SearchService;
/// use live_search_repository::BackendConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = SearchService::connect(BackendConfig::default())?;
/// let posts = Arc::new(MemoryCollection::new("posts"));
///
/// service
///     .register_index("posts", IndexOptions::new(posts, "title"))
///     .await?;
///
/// if let Some(result) = service.search("posts", "rust").await? {
///     println!("{} hits", result.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchService {
    registry: IndexRegistry,
    assembler: QueryAssembler,
    backend: BackendSlot,
    engine: SyncEngine,
    conditions: Arc<RwLock<Conditions>>,
    subscriptions: Arc<Mutex<HashMap<String, SyncHandle>>>,
}

impl SearchService {
    /// Create a service backed by OpenSearch at `config`.
    ///
    /// The client connects lazily; no request is sent until the first index
    /// registration or search.
    pub fn connect(config: BackendConfig) -> Result<Self, SyncError> {
        let provider = OpenSearchProvider::from_config(&config)?;
        Ok(Self::with_provider(Arc::new(provider), config))
    }

    /// Create a service around an existing backend provider.
    pub fn with_provider(provider: Arc<dyn SearchIndexProvider>, config: BackendConfig) -> Self {
        let backend: BackendSlot = Arc::new(RwLock::new(Arc::new(
            SearchIndexService::from_shared(provider, config),
        )));
        let registry = IndexRegistry::new();

        Self {
            assembler: QueryAssembler::new(registry.clone()),
            registry,
            engine: SyncEngine::new(Arc::clone(&backend)),
            backend,
            conditions: Arc::new(RwLock::new(Conditions::default())),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The registry holding every index definition.
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Register (or re-register) an index and start syncing its collection.
    ///
    /// The backend index is created if it does not exist yet; a failure to do
    /// so is logged and registration continues. Any earlier subscription for
    /// `name` is stopped, and its queued writes issued, before the new one
    /// starts.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexDefinition)` - A snapshot of the stored definition
    /// * `Err(SyncError::InvalidArgument)` - If `name` is not a valid index name
    /// * `Err(SyncError)` - If the collection cannot be observed
    pub async fn register_index(
        &self,
        name: &str,
        options: IndexOptions,
    ) -> Result<IndexDefinition, SyncError> {
        let definition = self.registry.register(name, options).await?;

        let backend = self.backend().await;
        if let Err(e) = backend.ensure_index(name).await {
            warn!(index = %name, error = %e, "Failed to ensure backend index exists");
        }

        let mut subscriptions = self.subscriptions.lock().await;
        if let Some(previous) = subscriptions.remove(name) {
            debug!(index = %name, "Stopping previous subscription");
            previous.stop().await?;
        }

        let handle = self
            .engine
            .subscribe(name, Arc::clone(&definition.collection))
            .await?;
        subscriptions.insert(name.to_string(), handle);

        Ok(definition)
    }

    /// Search `index` for `search_string`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(SearchResult))` - The shaped result
    /// * `Ok(None)` - If `index` is not registered
    /// * `Err(SyncError::Backend)` - If the backend rejects the query or its
    ///   response cannot be shaped
    pub async fn search(
        &self,
        index: &str,
        search_string: &str,
    ) -> Result<Option<SearchResult>, SyncError> {
        self.search_request(SearchRequest::new(index, search_string))
            .await
    }

    /// Search with an optional field projection.
    pub async fn search_request(
        &self,
        request: SearchRequest,
    ) -> Result<Option<SearchResult>, SyncError> {
        let Some(query) = self
            .assembler
            .assemble_query(&request.index, &request.query)
            .await
        else {
            debug!(index = %request.index, "Search against unregistered index");
            return Ok(None);
        };

        let raw = self.execute(&query).await?;
        let result = shape(query.definition.format, raw, request.projection())?;

        debug!(
            index = %request.index,
            results = result.len(),
            "Search complete"
        );
        Ok(Some(result))
    }

    /// Run the search in the background and hand the raw backend response to
    /// `callback`.
    ///
    /// Returns `None`, without calling `callback`, if the index is not
    /// registered.
    pub async fn search_with_callback<F>(
        &self,
        request: SearchRequest,
        callback: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<RawResponse, SyncError>) + Send + 'static,
    {
        let Some(query) = self
            .assembler
            .assemble_query(&request.index, &request.query)
            .await
        else {
            debug!(index = %request.index, "Search against unregistered index");
            return None;
        };

        let service = self.clone();
        Some(tokio::spawn(async move {
            let result = service.execute(&query).await;
            callback(result);
        }))
    }

    /// Run a search on `handle` and block the current thread until it completes.
    ///
    /// Must not be called from a thread driving the runtime behind `handle`.
    pub fn search_blocking(
        &self,
        handle: &Handle,
        request: SearchRequest,
    ) -> Result<Option<SearchResult>, SyncError> {
        let (sender, receiver) = oneshot::channel();
        let service = self.clone();

        handle.spawn(async move {
            let result = service.search_request(request).await;
            let _ = sender.send(result);
        });

        receiver
            .blocking_recv()
            .map_err(|e| SyncError::runtime(format!("Search task ended without a result: {}", e)))?
    }

    /// Set the property `key` of `index` to `value`, if the registered
    /// `on_change_property` condition allows it.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the property was changed
    /// * `Ok(false)` - If the condition rejected the change
    /// * `Err(SyncError::IndexNotFound)` - If `index` is not registered
    /// * `Err(SyncError::InvalidArgument)` - If `key` or `value` is unusable
    pub async fn change_property(
        &self,
        index: &str,
        key: &str,
        value: Value,
    ) -> Result<bool, SyncError> {
        let condition = Arc::clone(&self.conditions.read().await.on_change_property);

        if !condition.allows(index, key, &value) {
            debug!(index = %index, key = %key, "Property change rejected by condition");
            return Ok(false);
        }

        self.registry.set_property(index, key, value).await?;
        Ok(true)
    }

    /// The conditions currently in force.
    pub async fn conditions(&self) -> Conditions {
        self.conditions.read().await.clone()
    }

    /// Replace the conditions named in `update`.
    pub async fn set_conditions(&self, update: ConditionsUpdate) {
        self.conditions.write().await.apply(update);
    }

    /// Insert or update a facet by name. Returns false if `index` is not registered.
    pub async fn add_facet(&self, index: &str, name: &str, title: &str, terms: Value) -> bool {
        self.registry.add_facet(index, name, title, terms).await
    }

    /// Add each facet in turn. Returns false if `index` is not registered.
    pub async fn add_facets(&self, index: &str, facets: Vec<FacetSpec>) -> bool {
        self.registry.add_facets(index, facets).await
    }

    /// Remove the facet called `name`.
    pub async fn remove_facet(&self, index: &str, name: &str) -> bool {
        self.registry.remove_facet(index, name).await
    }

    /// Add a filter unless the same `(field, term)` pair is present.
    pub async fn add_filter(&self, index: &str, field: &str, term: Value) -> bool {
        self.registry.add_filter(index, field, term).await
    }

    pub async fn clear_filters(&self, index: &str) -> bool {
        self.registry.clear_filters(index).await
    }

    pub async fn facets(&self, index: &str) -> Option<Vec<FacetDefinition>> {
        self.registry.facets(index).await
    }

    pub async fn filters(&self, index: &str) -> Option<Vec<FilterDefinition>> {
        self.registry.filters(index).await
    }

    /// The current backend configuration.
    pub async fn config(&self) -> BackendConfig {
        self.backend().await.config().clone()
    }

    /// Merge `update` into the backend configuration and rebuild the
    /// OpenSearch client from the result.
    ///
    /// Running subscriptions write through the new client from their next
    /// write on.
    pub async fn configure(&self, update: BackendConfigUpdate) -> Result<BackendConfig, SyncError> {
        let config = self.config().await.merged(update);
        let provider = OpenSearchProvider::from_config(&config)?;
        self.replace_backend(Arc::new(provider), config.clone()).await;
        Ok(config)
    }

    /// Swap in a different backend provider.
    pub async fn replace_backend(
        &self,
        provider: Arc<dyn SearchIndexProvider>,
        config: BackendConfig,
    ) {
        info!(url = %config.url(), debug = config.debug, "Backend client replaced");
        *self.backend.write().await = Arc::new(SearchIndexService::from_shared(provider, config));
    }

    /// Counters of the subscription syncing `index`.
    pub async fn sync_stats(&self, index: &str) -> Option<Arc<SyncStats>> {
        self.subscriptions
            .lock()
            .await
            .get(index)
            .map(SyncHandle::stats)
    }

    /// Wait for the subscription of `index` to finish its outstanding writes.
    ///
    /// Only returns once the change feed of the index has ended, so the
    /// collection must be closed first.
    pub async fn drain(&self, index: &str) -> Result<(), SyncError> {
        let handle = self.subscriptions.lock().await.remove(index);
        match handle {
            Some(handle) => handle.closed().await,
            None => Ok(()),
        }
    }

    /// Stop every subscription.
    pub async fn shutdown(&self) {
        let mut subscriptions = self.subscriptions.lock().await;
        for (index, handle) in subscriptions.drain() {
            debug!(index = %index, "Stopping subscription");
            handle.abort();
        }
        info!("Search service stopped");
    }

    async fn backend(&self) -> Arc<SearchIndexService> {
        Arc::clone(&*self.backend.read().await)
    }

    async fn execute(&self, query: &AssembledQuery) -> Result<RawResponse, SyncError> {
        let backend = self.backend().await;
        Ok(backend.search(&query.definition.name, &query.body).await?)
    }
}
