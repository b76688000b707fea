//! Document representation shared by the sync and search paths.

use serde_json::{Map, Value};

/// A document as a flat map of field name to arbitrary JSON value.
///
/// Source documents, indexed documents and normalized search results all use
/// this shape. Values are never coerced; nested objects and arrays are kept as-is.
pub type FieldMap = Map<String, Value>;

/// Reserved key carrying the source collection id on every indexed document.
pub const SOURCE_ID_FIELD: &str = "_mid";

/// Key under which normalized search results expose the backend document id.
pub const ID_FIELD: &str = "_id";
