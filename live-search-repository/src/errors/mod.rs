//! Error types for the live search repository.
//!
//! This module provides a unified error type for all index backend operations.

mod search_index_error;

pub use search_index_error::SearchIndexError;
