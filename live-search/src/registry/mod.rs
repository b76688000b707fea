//! Index registry.
//!
//! Holds the configuration of every registered index, keyed by index name. All
//! mutation paths (registration, property changes, facet and filter upserts)
//! go through `IndexRegistry`; readers receive cloned snapshots so no lock is
//! held across a backend call.

mod definition;
pub mod mutators;

use std::collections::HashMap;
use std::sync::Arc;

use live_search_repository::validate_index_name;
use live_search_shared::{FacetDefinition, FacetSpec, FilterDefinition};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::SyncError;

pub use definition::{IndexDefinition, IndexOptions, SearchFields, DEFAULT_LIMIT};

/// Process-wide table of index definitions.
///
/// Cloning the registry yields another handle to the same table.
#[derive(Clone, Default)]
pub struct IndexRegistry {
    indexes: Arc<RwLock<HashMap<String, IndexDefinition>>>,
}

impl IndexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a definition built from `options` under `name`, overwriting any
    /// previous definition.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexDefinition)` - A snapshot of the stored definition
    /// * `Err(SyncError::InvalidArgument)` - If `name` is not a valid index name
    pub async fn register(
        &self,
        name: &str,
        options: IndexOptions,
    ) -> Result<IndexDefinition, SyncError> {
        validate_index_name(name).map_err(|e| SyncError::invalid_argument(e.to_string()))?;

        let definition = IndexDefinition::from_options(name, options);
        let previous = self
            .indexes
            .write()
            .await
            .insert(name.to_string(), definition.clone());

        info!(
            index = %name,
            limit = definition.limit,
            format = ?definition.format,
            replaced = previous.is_some(),
            "Registered index"
        );
        Ok(definition)
    }

    /// A snapshot of the definition registered under `name`.
    pub async fn get(&self, name: &str) -> Option<IndexDefinition> {
        self.indexes.read().await.get(name).cloned()
    }

    /// Returns true if an index is registered under `name`.
    pub async fn contains(&self, name: &str) -> bool {
        self.indexes.read().await.contains_key(name)
    }

    /// Names of all registered indexes, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Set the property `key` of index `name` to `value`.
    ///
    /// No predicate is consulted here; gating happens at the service boundary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the property was set
    /// * `Err(SyncError::InvalidArgument)` - If `name` or `key` is not a valid
    ///   identifier, or the value does not fit a typed key
    /// * `Err(SyncError::IndexNotFound)` - If no index is registered under `name`
    pub async fn set_property(&self, name: &str, key: &str, value: Value) -> Result<(), SyncError> {
        validate_identifier("index name", name)?;
        validate_property_key(key)?;

        let mut indexes = self.indexes.write().await;
        let definition = indexes
            .get_mut(name)
            .ok_or_else(|| SyncError::index_not_found(name))?;

        definition.set_property(key, value)?;
        debug!(index = %name, key = %key, "Property changed");
        Ok(())
    }

    /// Insert or update a facet by name.
    ///
    /// Returns false (and does nothing) if the index is not registered.
    pub async fn add_facet(&self, index: &str, name: &str, title: &str, terms: Value) -> bool {
        self.with_definition(index, |definition| {
            mutators::upsert_facet(&mut definition.facets, name, title, terms);
        })
        .await
    }

    /// Apply `add_facet` for each spec in order. Each upsert commits on its own.
    pub async fn add_facets(&self, index: &str, facets: Vec<FacetSpec>) -> bool {
        let mut applied = true;
        for facet in facets {
            applied &= self
                .add_facet(index, &facet.name, &facet.title, facet.terms)
                .await;
        }
        applied
    }

    /// Remove the facet called `name`. Returns true if a facet was removed.
    pub async fn remove_facet(&self, index: &str, name: &str) -> bool {
        let mut removed = false;
        self.with_definition(index, |definition| {
            let before = definition.facets.len();
            definition.facets.retain(|facet| facet.name != name);
            removed = definition.facets.len() != before;
        })
        .await;
        removed
    }

    /// Apply a filter unless the same `(field, term)` pair is already present.
    ///
    /// Returns false (and does nothing) if the index is not registered.
    pub async fn add_filter(&self, index: &str, field: &str, term: Value) -> bool {
        self.with_definition(index, |definition| {
            mutators::upsert_filter(&mut definition.filters, field, term);
        })
        .await
    }

    /// Remove every applied filter.
    pub async fn clear_filters(&self, index: &str) -> bool {
        self.with_definition(index, |definition| definition.filters.clear())
            .await
    }

    /// The facets of `index`, in order.
    pub async fn facets(&self, index: &str) -> Option<Vec<FacetDefinition>> {
        self.indexes
            .read()
            .await
            .get(index)
            .map(|definition| definition.facets.clone())
    }

    /// The filters of `index`, in order.
    pub async fn filters(&self, index: &str) -> Option<Vec<FilterDefinition>> {
        self.indexes
            .read()
            .await
            .get(index)
            .map(|definition| definition.filters.clone())
    }

    /// Run `mutate` on the definition of `index` under the write lock.
    async fn with_definition<F>(&self, index: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut IndexDefinition),
    {
        let mut indexes = self.indexes.write().await;
        match indexes.get_mut(index) {
            Some(definition) => {
                mutate(definition);
                true
            }
            None => {
                debug!(index = %index, "Ignoring mutation of unregistered index");
                false
            }
        }
    }
}

fn validate_identifier(what: &str, value: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::invalid_argument(format!(
            "{} must be a non-empty string",
            what
        )));
    }
    Ok(())
}

/// Property keys must contain only alphanumeric characters and underscores.
fn validate_property_key(key: &str) -> Result<(), SyncError> {
    validate_identifier("property key", key)?;

    if !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SyncError::invalid_argument(format!(
            "Property key '{}' contains invalid characters. Only alphanumeric characters and underscores are allowed",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemoryCollection;
    use live_search_shared::OutputFormat;
    use serde_json::json;

    fn options() -> IndexOptions {
        IndexOptions::new(Arc::new(MemoryCollection::new("posts")), "title")
    }

    async fn registry_with_index() -> IndexRegistry {
        let registry = IndexRegistry::new();
        registry.register("posts", options()).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = registry_with_index().await;

        let def = registry.get("posts").await.unwrap();
        assert_eq!(def.name, "posts");
        assert_eq!(def.limit, 10);
        assert!(registry.contains("posts").await);
        assert!(registry.get("missing").await.is_none());
        assert_eq!(registry.names().await, vec!["posts"]);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_names() {
        let registry = IndexRegistry::new();
        assert!(matches!(
            registry.register("Bad Name", options()).await,
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(registry.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_reregister_overwrites_and_resets_facets() {
        let registry = registry_with_index().await;
        registry
            .add_facet("posts", "tags", "Tags", json!({"field": "tags"}))
            .await;
        registry.set_property("posts", "limit", json!(3)).await.unwrap();

        registry
            .register("posts", options().with_format(OutputFormat::Native))
            .await
            .unwrap();

        let def = registry.get("posts").await.unwrap();
        assert_eq!(def.limit, 10);
        assert_eq!(def.format, OutputFormat::Native);
        assert!(def.facets.is_empty());
    }

    #[tokio::test]
    async fn test_set_property() {
        let registry = registry_with_index().await;

        registry.set_property("posts", "limit", json!(5)).await.unwrap();

        assert_eq!(registry.get("posts").await.unwrap().limit, 5);
    }

    #[tokio::test]
    async fn test_set_property_invalid_arguments() {
        let registry = registry_with_index().await;

        for (name, key) in [("", "limit"), ("posts", ""), ("posts", "li-mit"), ("posts", "a.b")] {
            let result = registry.set_property(name, key, json!(5)).await;
            assert!(
                matches!(result, Err(SyncError::InvalidArgument(_))),
                "expected ({:?}, {:?}) to be rejected",
                name,
                key
            );
        }
        assert_eq!(registry.get("posts").await.unwrap().limit, 10);
    }

    #[tokio::test]
    async fn test_set_property_unknown_index() {
        let registry = IndexRegistry::new();
        assert!(matches!(
            registry.set_property("missing", "limit", json!(5)).await,
            Err(SyncError::IndexNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_facet_twice_keeps_one() {
        let registry = registry_with_index().await;

        registry
            .add_facet("posts", "tags", "Tags", json!({"field": "tags"}))
            .await;
        registry
            .add_facet("posts", "tags", "Keywords", json!({"field": "keywords"}))
            .await;

        let facets = registry.facets("posts").await.unwrap();
        assert_eq!(
            facets,
            vec![FacetDefinition::new(
                "tags",
                "Keywords",
                json!({"field": "keywords"})
            )]
        );
    }

    #[tokio::test]
    async fn test_add_facets_in_order() {
        let registry = registry_with_index().await;

        let applied = registry
            .add_facets(
                "posts",
                vec![
                    FacetSpec::new("tags", "Tags", json!({"field": "tags"})),
                    FacetSpec::new("author", "Author", json!({"field": "author"})),
                    FacetSpec::new("tags", "Topics", json!({"field": "topics"})),
                ],
            )
            .await;

        assert!(applied);
        let facets = registry.facets("posts").await.unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].title, "Topics");
        assert_eq!(facets[1].name, "author");
    }

    #[tokio::test]
    async fn test_remove_facet() {
        let registry = registry_with_index().await;
        registry
            .add_facet("posts", "tags", "Tags", json!({"field": "tags"}))
            .await;

        assert!(registry.remove_facet("posts", "tags").await);
        assert!(!registry.remove_facet("posts", "tags").await);
        assert!(registry.facets("posts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_filter_twice_keeps_one() {
        let registry = registry_with_index().await;

        registry.add_filter("posts", "status", json!("open")).await;
        registry.add_filter("posts", "status", json!("open")).await;

        assert_eq!(
            registry.filters("posts").await.unwrap(),
            vec![FilterDefinition::new("status", json!("open"))]
        );

        assert!(registry.clear_filters("posts").await);
        assert!(registry.filters("posts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_on_unknown_index_are_silent() {
        let registry = IndexRegistry::new();

        assert!(!registry.add_facet("missing", "tags", "Tags", json!({})).await);
        assert!(!registry.add_filter("missing", "status", json!("open")).await);
        assert!(
            !registry
                .add_facets("missing", vec![FacetSpec::new("a", "A", json!({}))])
                .await
        );
        assert!(registry.facets("missing").await.is_none());
        assert!(registry.filters("missing").await.is_none());
    }
}
