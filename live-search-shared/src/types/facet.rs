//! Facet and filter definitions attached to a search index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, term-based aggregation dimension.
///
/// `name` is unique within an index. `terms` is the backend-specific term
/// specification and is treated as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetDefinition {
    pub name: String,
    pub title: String,
    pub terms: Value,
}

impl FacetDefinition {
    pub fn new(name: impl Into<String>, title: impl Into<String>, terms: Value) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            terms,
        }
    }
}

/// Facet specification as supplied to bulk facet addition.
pub type FacetSpec = FacetDefinition;

/// A field/term equality constraint applied to every query on an index.
///
/// At most one filter exists per `(field, term)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub field: String,
    pub term: Value,
}

impl FilterDefinition {
    pub fn new(field: impl Into<String>, term: Value) -> Self {
        Self {
            field: field.into(),
            term,
        }
    }

    /// Returns true if this filter constrains `field` to exactly `term`.
    pub fn matches(&self, field: &str, term: &Value) -> bool {
        self.field == field && &self.term == term
    }
}
