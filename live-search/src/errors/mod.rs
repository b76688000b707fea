//! Error types for the live search core.

use live_search_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur in the sync engine, the registry or the search path.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// A caller passed an unusable argument (bad index name, property key or value).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The named index has not been registered.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Error surfaced by the index backend.
    #[error("Backend error: {0}")]
    Backend(#[from] SearchIndexError),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    Channel(String),

    /// The async runtime was unavailable or a task failed.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl SyncError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an index not found error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound(name.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
