//! Query builder strategies.
//!
//! A builder turns the assembled inputs of a search (free text, searchable
//! fields, facet map, filter clauses) into the backend-native request body.
//! Each index is registered with one builder; `FuzzyQueryBuilder` is the default.

use std::fmt;

use serde_json::{json, Map, Value};

/// Inputs handed to a `QueryBuilder`.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// The caller's free-text search string.
    pub search_string: &'a str,
    /// The index's searchable fields, normalized to a list.
    pub fields: &'a [String],
    /// Facet title to `{"terms": ...}`.
    pub facets: &'a Map<String, Value>,
    /// One `{"term": {field: term}}` clause per applied filter, in filter order.
    pub filters: &'a [Value],
}

/// Builds a backend-native query body.
///
/// The assembler sets `size` on the returned body after the builder runs, so
/// builders need not (and cannot effectively) set it.
pub trait QueryBuilder: Send + Sync {
    fn build(&self, context: &QueryContext<'_>) -> Map<String, Value>;
}

impl<F> QueryBuilder for F
where
    F: Fn(&QueryContext<'_>) -> Map<String, Value> + Send + Sync,
{
    fn build(&self, context: &QueryContext<'_>) -> Map<String, Value> {
        self(context)
    }
}

impl fmt::Debug for dyn QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryBuilder")
    }
}

/// Fuzzy text match over the searchable fields.
///
/// Facets and filters are ignored; they are reserved for custom builders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyQueryBuilder;

impl FuzzyQueryBuilder {
    fn fuzzy_match(context: &QueryContext<'_>) -> Value {
        json!({
            "multi_match": {
                "query": context.search_string,
                "fields": context.fields,
                "fuzziness": "AUTO"
            }
        })
    }
}

impl QueryBuilder for FuzzyQueryBuilder {
    fn build(&self, context: &QueryContext<'_>) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("query".to_string(), Self::fuzzy_match(context));
        body
    }
}

/// Fuzzy text match constrained by the applied filters, with facets as aggregations.
///
/// Produces `{"query": {"bool": {"must": [<fuzzy>], "filter": [...]}}, "aggs": {...}}`.
/// `aggs` is omitted when the index has no facets.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetedQueryBuilder;

impl QueryBuilder for FacetedQueryBuilder {
    fn build(&self, context: &QueryContext<'_>) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(
            "query".to_string(),
            json!({
                "bool": {
                    "must": [FuzzyQueryBuilder::fuzzy_match(context)],
                    "filter": context.filters
                }
            }),
        );
        if !context.facets.is_empty() {
            body.insert("aggs".to_string(), Value::Object(context.facets.clone()));
        }
        body
    }
}
