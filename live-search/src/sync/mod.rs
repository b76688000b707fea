//! Sync engine.
//!
//! Mirrors a source collection into the index backend. Each subscription runs
//! two tasks: a reader that consumes the change feed and turns events into
//! write operations, and a writer that issues those operations against the
//! backend one at a time, in the order they were produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use live_search_repository::SearchIndexService;
use live_search_shared::{ChangeEvent, FieldMap};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::SyncError;
use crate::feed::{ChangeStream, SourceCollection};
use crate::projector::project_tagged;

/// Shared slot holding the current backend client.
///
/// `SearchService::configure` swaps the client in place; writers read the slot
/// for every operation.
pub type BackendSlot = Arc<RwLock<Arc<SearchIndexService>>>;

/// A single backend write produced from a change event.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Upsert { id: String, document: FieldMap },
    Delete { id: String },
}

impl WriteOp {
    pub fn id(&self) -> &str {
        match self {
            Self::Upsert { id, .. } | Self::Delete { id } => id,
        }
    }
}

/// Counters for one subscription.
#[derive(Debug, Default)]
pub struct SyncStats {
    events_received: AtomicU64,
    documents_upserted: AtomicU64,
    documents_deleted: AtomicU64,
    write_failures: AtomicU64,
}

impl SyncStats {
    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    pub fn documents_upserted(&self) -> u64 {
        self.documents_upserted.load(Ordering::Relaxed)
    }

    pub fn documents_deleted(&self) -> u64 {
        self.documents_deleted.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }
}

/// Handle to a running subscription.
///
/// Dropping the handle stops the subscription the same way [`SyncHandle::stop`]
/// does, without waiting for it.
pub struct SyncHandle {
    index: String,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    stop: oneshot::Sender<()>,
    stats: Arc<SyncStats>,
}

impl SyncHandle {
    /// The index this subscription writes to.
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Stop the subscription. Writes not yet issued are dropped.
    pub fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }

    /// Stop the subscription gracefully.
    ///
    /// Events the change feed has already delivered are still turned into
    /// writes, and every queued write is issued before this returns.
    pub async fn stop(self) -> Result<(), SyncError> {
        let _ = self.stop.send(());
        Self::join(self.reader, self.writer).await
    }

    /// Wait for the change feed to end and every outstanding write to finish.
    pub async fn closed(self) -> Result<(), SyncError> {
        let _stop = self.stop;
        Self::join(self.reader, self.writer).await
    }

    async fn join(reader: JoinHandle<()>, writer: JoinHandle<()>) -> Result<(), SyncError> {
        reader
            .await
            .map_err(|e| SyncError::runtime(format!("Sync reader failed: {}", e)))?;
        writer
            .await
            .map_err(|e| SyncError::runtime(format!("Sync writer failed: {}", e)))?;
        Ok(())
    }
}

/// Starts and runs change feed subscriptions.
#[derive(Clone)]
pub struct SyncEngine {
    backend: BackendSlot,
}

impl SyncEngine {
    pub fn new(backend: BackendSlot) -> Self {
        Self { backend }
    }

    /// Subscribe `index` to the change feed of `collection`.
    ///
    /// Documents already in the collection arrive first as `Added` events, so
    /// a fresh subscription performs the initial load.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncHandle)` - Once the change feed is open and both tasks are running
    /// * `Err(SyncError)` - If the collection cannot be observed
    pub async fn subscribe(
        &self,
        index: &str,
        collection: Arc<dyn SourceCollection>,
    ) -> Result<SyncHandle, SyncError> {
        let stream = collection.observe_changes().await?;
        let stats = Arc::new(SyncStats::default());
        let (op_sender, op_receiver) = mpsc::unbounded_channel();
        let (stop_sender, stop_receiver) = oneshot::channel();

        let writer = tokio::spawn(run_writer(
            index.to_string(),
            Arc::clone(&self.backend),
            op_receiver,
            Arc::clone(&stats),
        ));
        let reader = tokio::spawn(run_reader(
            index.to_string(),
            collection,
            stream,
            op_sender,
            Arc::clone(&stats),
            stop_receiver,
        ));

        info!(index = %index, "Subscribed to change feed");
        Ok(SyncHandle {
            index: index.to_string(),
            reader,
            writer,
            stop: stop_sender,
            stats,
        })
    }
}

/// Turn a change event into the write it requires.
///
/// `Changed` events only carry the changed fields, so the full document is
/// read back from `collection`. Returns `Ok(None)` when the document is gone
/// by the time it is read.
pub async fn plan_write(
    collection: &dyn SourceCollection,
    event: ChangeEvent,
) -> Result<Option<WriteOp>, SyncError> {
    match event {
        ChangeEvent::Added { id, fields } => {
            let document = project_tagged(&fields, &id);
            Ok(Some(WriteOp::Upsert { id, document }))
        }
        ChangeEvent::Changed { id, .. } => match collection.find_one(&id).await? {
            Some(current) => {
                let document = project_tagged(&current, &id);
                Ok(Some(WriteOp::Upsert { id, document }))
            }
            None => Ok(None),
        },
        ChangeEvent::Removed { id } => Ok(Some(WriteOp::Delete { id })),
    }
}

async fn run_reader(
    index: String,
    collection: Arc<dyn SourceCollection>,
    mut stream: ChangeStream,
    ops: mpsc::UnboundedSender<WriteOp>,
    stats: Arc<SyncStats>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            event = stream.next() => {
                let Some(event) = event else {
                    debug!(index = %index, "Change feed ended");
                    return;
                };
                if !forward(&index, collection.as_ref(), event, &ops, &stats).await {
                    return;
                }
            }
            _ = &mut stop => {
                // Events the feed already delivered still become writes
                while let Some(Some(event)) = stream.next().now_or_never() {
                    if !forward(&index, collection.as_ref(), event, &ops, &stats).await {
                        return;
                    }
                }
                debug!(index = %index, "Sync reader stopped");
                return;
            }
        }
    }
}

/// Plan the write for `event` and queue it. Returns false once the writer is gone.
async fn forward(
    index: &str,
    collection: &dyn SourceCollection,
    event: ChangeEvent,
    ops: &mpsc::UnboundedSender<WriteOp>,
    stats: &SyncStats,
) -> bool {
    stats.events_received.fetch_add(1, Ordering::Relaxed);
    let id = event.id().to_string();

    match plan_write(collection, event).await {
        Ok(Some(op)) => {
            if ops.send(op).is_err() {
                warn!(index = %index, "Sync writer has stopped, ending subscription");
                return false;
            }
        }
        Ok(None) => {
            debug!(index = %index, id = %id, "Changed document no longer exists, skipping");
        }
        Err(e) => {
            error!(index = %index, id = %id, error = %e, "Failed to read changed document");
        }
    }
    true
}

#[instrument(skip(backend, ops, stats), fields(index = %index))]
async fn run_writer(
    index: String,
    backend: BackendSlot,
    mut ops: mpsc::UnboundedReceiver<WriteOp>,
    stats: Arc<SyncStats>,
) {
    while let Some(op) = ops.recv().await {
        // Read the slot per write so a reconfigured client is picked up
        let service = Arc::clone(&*backend.read().await);
        let debug_acks = service.config().debug;

        let result = match &op {
            WriteOp::Upsert { id, document } => service
                .upsert(&index, document, id)
                .await
                .map(|()| &stats.documents_upserted),
            WriteOp::Delete { id } => service
                .delete(&index, id)
                .await
                .map(|()| &stats.documents_deleted),
        };

        match result {
            Ok(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
                if debug_acks {
                    info!(id = %op.id(), op = %op_kind(&op), "Backend write acknowledged");
                } else {
                    debug!(id = %op.id(), op = %op_kind(&op), "Backend write acknowledged");
                }
            }
            Err(e) => {
                stats.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!(id = %op.id(), op = %op_kind(&op), error = %e, "Backend write failed");
            }
        }
    }

    debug!("Sync writer drained");
}

fn op_kind(op: &WriteOp) -> &'static str {
    match op {
        WriteOp::Upsert { .. } => "upsert",
        WriteOp::Delete { .. } => "delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MemoryCollection;
    use live_search_shared::SOURCE_ID_FIELD;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_plan_added_is_tagged_upsert() {
        let collection = MemoryCollection::new("posts");
        let event = ChangeEvent::added("a1", fields(json!({"title": "Hi", "n": 2})));

        let op = plan_write(&collection, event).await.unwrap();

        assert_eq!(
            op,
            Some(WriteOp::Upsert {
                id: "a1".to_string(),
                document: fields(json!({"title": "Hi", "n": 2, (SOURCE_ID_FIELD): "a1"})),
            })
        );
    }

    #[tokio::test]
    async fn test_plan_changed_reads_full_document() {
        let collection = MemoryCollection::new("posts");
        collection
            .insert("a1", fields(json!({"title": "Hi", "n": 2})))
            .await
            .unwrap();
        collection
            .update("a1", fields(json!({"n": 3})))
            .await
            .unwrap();

        let event = ChangeEvent::changed("a1", fields(json!({"n": 3})));
        let op = plan_write(&collection, event).await.unwrap();

        assert_eq!(
            op,
            Some(WriteOp::Upsert {
                id: "a1".to_string(),
                document: fields(json!({"title": "Hi", "n": 3, (SOURCE_ID_FIELD): "a1"})),
            })
        );
    }

    #[tokio::test]
    async fn test_plan_changed_missing_document_is_skipped() {
        let collection = MemoryCollection::new("posts");
        let event = ChangeEvent::changed("gone", fields(json!({"n": 1})));

        assert_eq!(plan_write(&collection, event).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_plan_removed_is_delete() {
        let collection = MemoryCollection::new("posts");

        let op = plan_write(&collection, ChangeEvent::removed("a1"))
            .await
            .unwrap();

        assert_eq!(op, Some(WriteOp::Delete { id: "a1".to_string() }));
        assert_eq!(op.unwrap().id(), "a1");
    }

    #[tokio::test]
    async fn test_stopped_reader_forwards_delivered_events() {
        let collection: Arc<dyn SourceCollection> = Arc::new(MemoryCollection::new("posts"));
        // The feed never ends on its own
        let stream = futures::stream::iter(vec![
            ChangeEvent::added("a1", fields(json!({"n": 1}))),
            ChangeEvent::removed("a1"),
        ])
        .chain(futures::stream::pending())
        .boxed();
        let (ops, mut queued) = mpsc::unbounded_channel();
        let (stop, stop_receiver) = oneshot::channel();
        let stats = Arc::new(SyncStats::default());

        stop.send(()).unwrap();
        run_reader(
            "posts".to_string(),
            collection,
            stream,
            ops,
            Arc::clone(&stats),
            stop_receiver,
        )
        .await;

        assert_eq!(queued.recv().await.map(|op| op.id().to_string()), Some("a1".to_string()));
        assert_eq!(queued.recv().await, Some(WriteOp::Delete { id: "a1".to_string() }));
        assert_eq!(queued.recv().await, None);
        assert_eq!(stats.events_received(), 2);
    }
}
