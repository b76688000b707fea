//! In-process source collection.
//!
//! `MemoryCollection` stores documents in memory and pushes a `ChangeEvent` to
//! every observer on each mutation. Events are sent while the collection lock
//! is held, so all observers see mutations in the same order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use live_search_repository::validate_document_id;
use live_search_shared::{ChangeEvent, FieldMap};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::errors::SyncError;
use crate::feed::{ChangeStream, SourceCollection};

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, FieldMap>,
    observers: Vec<mpsc::UnboundedSender<ChangeEvent>>,
}

impl Inner {
    fn notify(&mut self, event: ChangeEvent) {
        // Drop observers whose stream has gone away
        self.observers
            .retain(|observer| observer.send(event.clone()).is_ok());
    }
}

/// A document collection held in memory.
#[derive(Default)]
pub struct MemoryCollection {
    name: String,
    inner: Mutex<Inner>,
}

impl MemoryCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a new document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was inserted
    /// * `Err(SyncError::InvalidArgument)` - If the id is blank or already present
    pub async fn insert(&self, id: impl Into<String>, doc: FieldMap) -> Result<(), SyncError> {
        let id = id.into();
        // Ids follow the backend's document id rule
        validate_document_id(&id).map_err(|e| SyncError::invalid_argument(e.to_string()))?;

        let mut inner = self.inner.lock().await;
        if inner.documents.contains_key(&id) {
            return Err(SyncError::invalid_argument(format!(
                "Duplicate document id '{}' in collection '{}'",
                id, self.name
            )));
        }

        inner.documents.insert(id.clone(), doc.clone());
        inner.notify(ChangeEvent::added(id, doc));
        Ok(())
    }

    /// Set `fields` on an existing document, leaving other fields untouched.
    ///
    /// Observers receive a `Changed` event carrying only `fields`.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no document has this id.
    pub async fn update(&self, id: &str, fields: FieldMap) -> Result<bool, SyncError> {
        let mut inner = self.inner.lock().await;
        let Some(doc) = inner.documents.get_mut(id) else {
            return Ok(false);
        };

        for (key, value) in &fields {
            doc.insert(key.clone(), value.clone());
        }
        inner.notify(ChangeEvent::changed(id, fields));
        Ok(true)
    }

    /// Remove a document.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no document has this id.
    pub async fn remove(&self, id: &str) -> Result<bool, SyncError> {
        let mut inner = self.inner.lock().await;
        if inner.documents.remove(id).is_none() {
            return Ok(false);
        }

        inner.notify(ChangeEvent::removed(id));
        Ok(true)
    }

    /// Number of documents in the collection.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.documents.len()
    }

    /// Returns true if the collection holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.documents.is_empty()
    }

    /// End every open observation. Their change streams terminate.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        debug!(
            collection = %self.name,
            observers = inner.observers.len(),
            "Closing change feed"
        );
        inner.observers.clear();
    }
}

#[async_trait]
impl SourceCollection for MemoryCollection {
    async fn observe_changes(&self) -> Result<ChangeStream, SyncError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().await;

        for (id, doc) in &inner.documents {
            sender
                .send(ChangeEvent::added(id.clone(), doc.clone()))
                .map_err(|e| SyncError::channel(e.to_string()))?;
        }
        inner.observers.push(sender);

        debug!(
            collection = %self.name,
            initial_documents = inner.documents.len(),
            "Observer attached"
        );
        Ok(UnboundedReceiverStream::new(receiver).boxed())
    }

    async fn find_one(&self, id: &str) -> Result<Option<FieldMap>, SyncError> {
        Ok(self.inner.lock().await.documents.get(id).cloned())
    }
}
