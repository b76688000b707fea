//! # Live Search
//!
//! Keeps a full-text search index synchronized with a live document collection
//! and serves fuzzy, faceted and filtered searches against it.
//!
//! ## Architecture
//!
//! 1. **Feed**: A source collection publishes add/change/remove events
//! 2. **Sync**: Each registered index mirrors its collection into the backend
//! 3. **Query**: Searches are assembled from the index definition
//! 4. **Shaper**: Backend responses are turned into result documents
//! 5. **Service**: One facade over registry, sync engine and backend client
//!
//! ## Modules
//!
//! - [`conditions`]: Predicates gating external property changes
//! - [`config`]: Environment configuration and dependency wiring
//! - [`errors`]: Error types for the core
//! - [`feed`]: Source collection interface and in-memory collection
//! - [`orchestrator`]: Line-oriented command loop driving the binary
//! - [`projector`]: Document projection before indexing
//! - [`query`]: Query builders and the query assembler
//! - [`registry`]: Index definitions and their mutators
//! - [`service`]: The `SearchService` facade
//! - [`shaper`]: Result shaping and field projection
//! - [`sync`]: Change feed subscriptions

pub mod conditions;
pub mod config;
pub mod errors;
pub mod feed;
pub mod orchestrator;
pub mod projector;
pub mod query;
pub mod registry;
pub mod service;
pub mod shaper;
pub mod sync;

pub use config::Dependencies;
pub use errors::SyncError;
pub use service::SearchService;

use thiserror::Error;

/// Errors that can occur during startup or while running the binary.
#[derive(Error, Debug)]
pub enum LiveSearchError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from the sync engine or the search path.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Reading commands or writing replies failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LiveSearchError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
