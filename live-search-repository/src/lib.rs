//! # Live Search Repository
//!
//! This crate provides traits and implementations for interacting with the
//! index backend. It includes definitions for errors, the backend interface,
//! connection configuration, and a concrete implementation for OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod utils;

pub use config::{BackendConfig, BackendConfigUpdate, DEFAULT_HOST, DEFAULT_PORT};
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use service::SearchIndexService;
pub use utils::{validate_document_id, validate_index_name};
