//! Shared test support: an in-memory index backend.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use live_search_repository::{SearchIndexError, SearchIndexProvider};
use live_search_shared::{FieldMap, RawResponse};
use serde_json::{json, Map, Value};
use tokio::time::{sleep, timeout};

/// A backend call, in the order it was received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upsert { index: String, id: String, document: FieldMap },
    Delete { index: String, id: String },
}

// Mock Search Provider for testing
pub struct MockSearchProvider {
    documents: Mutex<BTreeMap<(String, String), FieldMap>>,
    calls: Mutex<Vec<Call>>,
    queries: Mutex<Vec<(String, Map<String, Value>)>>,
    ensured: Mutex<Vec<String>>,
    fail_writes: bool,
    fail_search: bool,
    upsert_delay: Option<Duration>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            ensured: Mutex::new(Vec::new()),
            fail_writes: false,
            fail_search: false,
            upsert_delay: None,
        }
    }

    /// Every upsert sleeps for `delay` before it is recorded.
    pub fn slow_upserts(delay: Duration) -> Self {
        Self {
            upsert_delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    pub fn failing_search() -> Self {
        Self {
            fail_search: true,
            ..Self::new()
        }
    }

    pub fn document(&self, index: &str, id: &str) -> Option<FieldMap> {
        self.documents
            .lock()
            .unwrap()
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.documents
            .lock()
            .unwrap()
            .keys()
            .filter(|(i, _)| i == index)
            .count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                Call::Upsert { id: call_id, .. } | Call::Delete { id: call_id, .. } => call_id == id,
            })
            .collect()
    }

    pub fn last_query(&self) -> Option<(String, Map<String, Value>)> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn ensured(&self) -> Vec<String> {
        self.ensured.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError> {
        self.ensured.lock().unwrap().push(index.to_string());
        Ok(())
    }

    async fn upsert_document(
        &self,
        index: &str,
        document: &FieldMap,
        id: &str,
    ) -> Result<(), SearchIndexError> {
        if let Some(delay) = self.upsert_delay {
            sleep(delay).await;
        }
        self.calls.lock().unwrap().push(Call::Upsert {
            index: index.to_string(),
            id: id.to_string(),
            document: document.clone(),
        });
        if self.fail_writes {
            return Err(SearchIndexError::index("Mock write failure"));
        }
        self.documents
            .lock()
            .unwrap()
            .insert((index.to_string(), id.to_string()), document.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchIndexError> {
        self.calls.lock().unwrap().push(Call::Delete {
            index: index.to_string(),
            id: id.to_string(),
        });
        if self.fail_writes {
            return Err(SearchIndexError::delete("Mock delete failure"));
        }
        self.documents
            .lock()
            .unwrap()
            .remove(&(index.to_string(), id.to_string()));
        Ok(())
    }

    /// Returns every stored document of `index` as a hit, as text.
    async fn search(
        &self,
        index: &str,
        query: &Map<String, Value>,
    ) -> Result<RawResponse, SearchIndexError> {
        self.queries
            .lock()
            .unwrap()
            .push((index.to_string(), query.clone()));
        if self.fail_search {
            return Err(SearchIndexError::search("Mock search failure"));
        }

        let hits: Vec<Value> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|((i, _), _)| i == index)
            .map(|((i, id), doc)| json!({"_index": i, "_id": id, "_score": 1.0, "_source": doc}))
            .collect();

        let response = json!({
            "took": 1,
            "timed_out": false,
            "hits": {"total": {"value": hits.len(), "relation": "eq"}, "hits": hits}
        });
        Ok(RawResponse::Text(response.to_string()))
    }
}

pub fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let result = timeout(Duration::from_secs(2), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "condition not reached in time");
}
