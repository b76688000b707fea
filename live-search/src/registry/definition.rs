//! Index definitions and their registration options.

use std::fmt;
use std::sync::Arc;

use live_search_shared::{FacetDefinition, FilterDefinition, OutputFormat};
use serde_json::{Map, Value};

use crate::errors::SyncError;
use crate::feed::SourceCollection;
use crate::query::{FuzzyQueryBuilder, QueryBuilder};
use crate::registry::mutators::{upsert_facet, upsert_filter};

/// Default number of results returned per search.
pub const DEFAULT_LIMIT: usize = 10;

/// Keys that identify an index and cannot be changed through `set_property`.
const FIXED_KEYS: &[&str] = &["name", "collection", "query", "query_builder"];

/// The searchable field declaration of an index: one field or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFields {
    Single(String),
    Many(Vec<String>),
}

impl SearchFields {
    /// The declaration as a list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Single(field) => vec![field.clone()],
            Self::Many(fields) => fields.clone(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(field) => Some(Self::Single(field.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::Many),
            _ => None,
        }
    }
}

impl From<&str> for SearchFields {
    fn from(field: &str) -> Self {
        Self::Single(field.to_string())
    }
}

impl From<String> for SearchFields {
    fn from(field: String) -> Self {
        Self::Single(field)
    }
}

impl From<Vec<String>> for SearchFields {
    fn from(fields: Vec<String>) -> Self {
        Self::Many(fields)
    }
}

impl From<&[&str]> for SearchFields {
    fn from(fields: &[&str]) -> Self {
        Self::Many(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// Registration options. Unset options take their defaults on registration.
#[derive(Clone)]
pub struct IndexOptions {
    pub collection: Arc<dyn SourceCollection>,
    pub field: SearchFields,
    pub query_builder: Option<Arc<dyn QueryBuilder>>,
    pub limit: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl IndexOptions {
    /// Options for an index over `collection`, searching `field`.
    pub fn new(collection: Arc<dyn SourceCollection>, field: impl Into<SearchFields>) -> Self {
        Self {
            collection,
            field: field.into(),
            query_builder: None,
            limit: None,
            format: None,
        }
    }

    /// Use a custom query builder.
    pub fn with_query_builder(mut self, builder: impl QueryBuilder + 'static) -> Self {
        self.query_builder = Some(Arc::new(builder));
        self
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Per-index configuration held by the registry.
#[derive(Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub collection: Arc<dyn SourceCollection>,
    pub field: SearchFields,
    pub query_builder: Arc<dyn QueryBuilder>,
    pub limit: usize,
    pub format: OutputFormat,
    pub facets: Vec<FacetDefinition>,
    pub filters: Vec<FilterDefinition>,
    /// Properties set through `set_property` that are not one of the typed fields.
    pub properties: Map<String, Value>,
}

impl fmt::Debug for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("limit", &self.limit)
            .field("format", &self.format)
            .field("facets", &self.facets)
            .field("filters", &self.filters)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl IndexDefinition {
    /// Build a definition from registration options, applying defaults.
    ///
    /// Facets and filters always start empty.
    pub fn from_options(name: impl Into<String>, options: IndexOptions) -> Self {
        Self {
            name: name.into(),
            collection: options.collection,
            field: options.field,
            query_builder: options
                .query_builder
                .unwrap_or_else(|| Arc::new(FuzzyQueryBuilder)),
            limit: options.limit.unwrap_or(DEFAULT_LIMIT),
            format: options.format.unwrap_or_default(),
            facets: Vec::new(),
            filters: Vec::new(),
            properties: Map::new(),
        }
    }

    /// Set the property `key` to `value`.
    ///
    /// `limit`, `format`, `field`, `facets` and `filters` are typed: a value of
    /// the wrong shape is rejected and nothing changes. `name`, `collection`
    /// and the query builder cannot be set. Any other key is stored as-is in
    /// `properties`.
    pub fn set_property(&mut self, key: &str, value: Value) -> Result<(), SyncError> {
        let invalid = |expected: &str| {
            SyncError::invalid_argument(format!(
                "Property '{}' of index '{}' expects {}",
                key, self.name, expected
            ))
        };

        match key {
            "limit" => {
                let limit = value
                    .as_u64()
                    .and_then(|limit| usize::try_from(limit).ok())
                    .ok_or_else(|| invalid("a non-negative integer"))?;
                self.limit = limit;
            }
            "format" => {
                let format = value
                    .as_str()
                    .and_then(OutputFormat::parse)
                    .ok_or_else(|| invalid("\"native\" or \"normalized\""))?;
                self.format = format;
            }
            "field" => {
                self.field = SearchFields::from_value(&value)
                    .ok_or_else(|| invalid("a field name or a list of field names"))?;
            }
            "facets" => {
                let facets: Vec<FacetDefinition> = serde_json::from_value(value)
                    .map_err(|_| invalid("a list of {name, title, terms} objects"))?;
                let mut deduped = Vec::with_capacity(facets.len());
                for facet in facets {
                    upsert_facet(&mut deduped, &facet.name, &facet.title, facet.terms);
                }
                self.facets = deduped;
            }
            "filters" => {
                let filters: Vec<FilterDefinition> = serde_json::from_value(value)
                    .map_err(|_| invalid("a list of {field, term} objects"))?;
                let mut deduped = Vec::with_capacity(filters.len());
                for filter in filters {
                    upsert_filter(&mut deduped, &filter.field, filter.term);
                }
                self.filters = deduped;
            }
            key if FIXED_KEYS.contains(&key) => {
                return Err(SyncError::invalid_argument(format!(
                    "Property '{}' of index '{}' cannot be changed",
                    key, self.name
                )));
            }
            _ => {
                self.properties.insert(key.to_string(), value);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemoryCollection;
    use serde_json::json;

    fn definition() -> IndexDefinition {
        let collection = Arc::new(MemoryCollection::new("posts"));
        IndexDefinition::from_options("posts", IndexOptions::new(collection, "title"))
    }

    #[test]
    fn test_defaults_applied() {
        let def = definition();
        assert_eq!(def.limit, DEFAULT_LIMIT);
        assert_eq!(def.format, OutputFormat::Normalized);
        assert_eq!(def.field, SearchFields::Single("title".to_string()));
        assert!(def.facets.is_empty());
        assert!(def.filters.is_empty());
    }

    #[test]
    fn test_options_override_defaults() {
        let collection = Arc::new(MemoryCollection::new("posts"));
        let options = IndexOptions::new(collection, vec!["title".to_string(), "body".to_string()])
            .with_limit(25)
            .with_format(OutputFormat::Native);

        let def = IndexDefinition::from_options("posts", options);
        assert_eq!(def.limit, 25);
        assert_eq!(def.format, OutputFormat::Native);
        assert_eq!(def.field.to_list(), vec!["title", "body"]);
    }

    #[test]
    fn test_search_fields_to_list() {
        assert_eq!(SearchFields::from("title").to_list(), vec!["title"]);
        let many: &[&str] = &["a", "b"];
        assert_eq!(SearchFields::from(many).to_list(), vec!["a", "b"]);
    }

    #[test]
    fn test_set_typed_properties() {
        let mut def = definition();

        def.set_property("limit", json!(5)).unwrap();
        def.set_property("format", json!("native")).unwrap();
        def.set_property("field", json!(["title", "summary"])).unwrap();

        assert_eq!(def.limit, 5);
        assert_eq!(def.format, OutputFormat::Native);
        assert_eq!(def.field.to_list(), vec!["title", "summary"]);
    }

    #[test]
    fn test_set_typed_property_with_wrong_value_is_rejected() {
        let mut def = definition();

        for (key, value) in [
            ("limit", json!("five")),
            ("limit", json!(-1)),
            ("format", json!("xml")),
            ("field", json!(42)),
            ("field", json!(["title", 1])),
            ("facets", json!("tags")),
            ("filters", json!([{"field": "status"}])),
        ] {
            let result = def.set_property(key, value);
            assert!(
                matches!(result, Err(SyncError::InvalidArgument(_))),
                "expected '{}' to be rejected",
                key
            );
        }

        assert_eq!(def.limit, DEFAULT_LIMIT);
        assert_eq!(def.format, OutputFormat::Normalized);
        assert_eq!(def.field.to_list(), vec!["title"]);
    }

    #[test]
    fn test_set_fixed_property_is_rejected() {
        let mut def = definition();
        assert!(def.set_property("name", json!("other")).is_err());
        assert!(def.set_property("query", json!({})).is_err());
        assert_eq!(def.name, "posts");
    }

    #[test]
    fn test_set_untyped_property_is_stored() {
        let mut def = definition();
        def.set_property("highlight", json!({"fields": {"title": {}}}))
            .unwrap();
        assert_eq!(def.properties["highlight"], json!({"fields": {"title": {}}}));
    }

    #[test]
    fn test_set_facets_and_filters_dedupes() {
        let mut def = definition();

        def.set_property(
            "facets",
            json!([
                {"name": "tags", "title": "Tags", "terms": {"field": "tags"}},
                {"name": "tags", "title": "Keywords", "terms": {"field": "kw"}}
            ]),
        )
        .unwrap();
        def.set_property(
            "filters",
            json!([
                {"field": "status", "term": "open"},
                {"field": "status", "term": "open"}
            ]),
        )
        .unwrap();

        assert_eq!(def.facets.len(), 1);
        assert_eq!(def.facets[0].title, "Keywords");
        assert_eq!(def.filters.len(), 1);
    }
}
