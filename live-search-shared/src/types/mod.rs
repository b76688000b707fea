//! This module defines the core data structures and types used across the live search
//! crates. It re-exports the most commonly used types.

pub mod change_event;
pub mod document;
pub mod facet;
pub mod search_query;
pub mod search_result;

pub use change_event::ChangeEvent;
pub use document::FieldMap;
pub use facet::{FacetDefinition, FacetSpec, FilterDefinition};
pub use search_query::{OutputFormat, SearchRequest};
pub use search_result::{RawResponse, SearchResult};
