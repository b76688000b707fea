//! OpenSearch implementation of the index backend.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend.

mod index_config;
mod provider;

pub use index_config::get_index_settings;
pub use provider::OpenSearchProvider;
