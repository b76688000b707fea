//! # Live Search Shared
//!
//! This crate defines the data structures shared across the live search
//! ecosystem: change events flowing out of a source collection, facet and
//! filter definitions attached to an index, and the request/response types of
//! the search path.

pub mod types;

pub use types::change_event::ChangeEvent;
pub use types::document::{FieldMap, ID_FIELD, SOURCE_ID_FIELD};
pub use types::facet::{FacetDefinition, FacetSpec, FilterDefinition};
pub use types::search_query::{OutputFormat, SearchRequest};
pub use types::search_result::{RawResponse, SearchResult};
