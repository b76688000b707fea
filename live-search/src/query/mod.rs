//! Query assembly.
//!
//! Combines the free-text search string with the facets and filters registered
//! on an index into one backend-native request body:
//!
//! 1. Look up the index definition (absent: no query).
//! 2. Normalize the searchable fields to a list.
//! 3. Map each facet's title to `{"terms": <terms>}`.
//! 4. Turn each filter into a `{"term": {field: term}}` clause, in order.
//! 5. Run the index's query builder.
//! 6. Set `size` to the index's result limit, overriding the builder.

mod builder;

use live_search_shared::{FacetDefinition, FilterDefinition};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::registry::{IndexDefinition, IndexRegistry};

pub use builder::{FacetedQueryBuilder, FuzzyQueryBuilder, QueryBuilder, QueryContext};

/// Map facet titles to their term specifications.
///
/// Facets sharing a title collide: the later facet wins.
pub fn facet_map(facets: &[FacetDefinition]) -> Map<String, Value> {
    let mut map = Map::new();
    for facet in facets {
        map.insert(facet.title.clone(), json!({ "terms": facet.terms }));
    }
    map
}

/// One single-field term clause per filter, in filter order.
pub fn filter_clauses(filters: &[FilterDefinition]) -> Vec<Value> {
    filters
        .iter()
        .map(|filter| {
            let mut term = Map::new();
            term.insert(filter.field.clone(), filter.term.clone());
            json!({ "term": term })
        })
        .collect()
}

/// Assemble the request body for `search_string` against `definition`.
pub fn assemble_definition(definition: &IndexDefinition, search_string: &str) -> Map<String, Value> {
    let fields = definition.field.to_list();
    let facets = facet_map(&definition.facets);
    let filters = filter_clauses(&definition.filters);

    let context = QueryContext {
        search_string,
        fields: &fields,
        facets: &facets,
        filters: &filters,
    };

    let mut body = definition.query_builder.build(&context);
    body.insert("size".to_string(), json!(definition.limit));
    body
}

/// A request body together with the index definition it was built from.
#[derive(Debug, Clone)]
pub struct AssembledQuery {
    pub definition: IndexDefinition,
    pub body: Map<String, Value>,
}

/// Assembles queries for registered indexes.
#[derive(Clone)]
pub struct QueryAssembler {
    registry: IndexRegistry,
}

impl QueryAssembler {
    pub fn new(registry: IndexRegistry) -> Self {
        Self { registry }
    }

    /// Assemble the request body for `search_string` against the index `index`.
    ///
    /// Returns `None` if the index is not registered.
    pub async fn assemble(&self, index: &str, search_string: &str) -> Option<Map<String, Value>> {
        self.assemble_query(index, search_string)
            .await
            .map(|query| query.body)
    }

    /// Like [`assemble`](Self::assemble), but also returns the definition
    /// snapshot the body was built from.
    pub async fn assemble_query(&self, index: &str, search_string: &str) -> Option<AssembledQuery> {
        let Some(definition) = self.registry.get(index).await else {
            debug!(index = %index, "Cannot assemble query for unregistered index");
            return None;
        };
        let body = assemble_definition(&definition, search_string);
        Some(AssembledQuery { definition, body })
    }
}
