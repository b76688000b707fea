//! Idempotent upserts on facet and filter lists.

use live_search_shared::{FacetDefinition, FilterDefinition};
use serde_json::Value;

/// Insert or update a facet by name.
///
/// An existing facet keeps its position and takes the new title and terms;
/// otherwise the facet is appended.
pub fn upsert_facet(facets: &mut Vec<FacetDefinition>, name: &str, title: &str, terms: Value) {
    match facets.iter_mut().find(|facet| facet.name == name) {
        Some(facet) => {
            facet.title = title.to_string();
            facet.terms = terms;
        }
        None => facets.push(FacetDefinition::new(name, title, terms)),
    }
}

/// Apply a filter unless the same `(field, term)` pair is already present.
///
/// Returns true if the filter was appended.
pub fn upsert_filter(filters: &mut Vec<FilterDefinition>, field: &str, term: Value) -> bool {
    if filters.iter().any(|filter| filter.matches(field, &term)) {
        return false;
    }
    filters.push(FilterDefinition::new(field, term));
    true
}
