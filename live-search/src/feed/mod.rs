//! Change feed module.
//!
//! Defines the source collection interface the sync engine observes, and an
//! in-process collection implementing it.

mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use live_search_shared::{ChangeEvent, FieldMap};

use crate::errors::SyncError;

pub use memory::MemoryCollection;

/// Stream of change events for one observation.
///
/// The stream ends when the collection stops delivering events.
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

/// A live, mutable collection of documents keyed by id.
#[async_trait]
pub trait SourceCollection: Send + Sync {
    /// Start observing the collection.
    ///
    /// Documents already present are delivered first as `Added` events,
    /// followed by live events. For any one id, events are delivered in
    /// mutation order.
    async fn observe_changes(&self) -> Result<ChangeStream, SyncError>;

    /// Read the full current version of a document.
    async fn find_one(&self, id: &str) -> Result<Option<FieldMap>, SyncError>;
}
