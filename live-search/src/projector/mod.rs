//! Field projection for indexing.
//!
//! Turns a raw source document into the field map that is written to the index.

use live_search_shared::{FieldMap, SOURCE_ID_FIELD};

/// Return an index-safe copy of `doc`.
///
/// Every field is passed through unchanged: no type coercion and no
/// stringification, so nested objects and arrays reach the backend as
/// structured values.
pub fn project(doc: &FieldMap) -> FieldMap {
    doc.clone()
}

/// Project `doc` and tag the copy with the source id under the reserved key.
pub fn project_tagged(doc: &FieldMap, id: &str) -> FieldMap {
    let mut projected = project(doc);
    projected.insert(SOURCE_ID_FIELD.to_string(), id.into());
    projected
}
