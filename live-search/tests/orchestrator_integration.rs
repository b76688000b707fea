//! Integration tests for the live search orchestrator.
//!
//! These tests use the real Orchestrator with scripted input and an in-memory
//! backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fields, MockSearchProvider};
use live_search::feed::MemoryCollection;
use live_search::orchestrator::{Orchestrator, OrchestratorConfig};
use live_search::registry::IndexOptions;
use live_search::SearchService;
use live_search_repository::BackendConfig;
use serde_json::{json, Value};
use tokio::time::timeout;

/// Helper to create a test orchestrator reading `input`.
async fn create_test_orchestrator(
    input: &'static str,
) -> (Orchestrator<&'static [u8], Vec<u8>>, Arc<MockSearchProvider>) {
    let provider = Arc::new(MockSearchProvider::new());
    let service = SearchService::with_provider(provider.clone(), BackendConfig::default());
    let collection = Arc::new(MemoryCollection::new("posts"));

    service
        .register_index("posts", IndexOptions::new(collection.clone(), "title"))
        .await
        .unwrap();

    let orchestrator = Orchestrator::with_config(
        service,
        collection,
        "posts",
        input.as_bytes(),
        Vec::new(),
        OrchestratorConfig {
            progress_interval: Duration::from_millis(50),
        },
    );

    (orchestrator, provider)
}

async fn run(input: &'static str) -> (Vec<Value>, Arc<MockSearchProvider>) {
    let (mut orchestrator, provider) = create_test_orchestrator(input).await;

    let result = timeout(Duration::from_secs(5), orchestrator.run()).await;
    assert!(result.is_ok(), "orchestrator did not finish");
    assert!(result.unwrap().is_ok());

    let output = String::from_utf8(orchestrator.into_output()).unwrap();
    let replies = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (replies, provider)
}

#[tokio::test]
async fn test_mutations_reach_backend() {
    let input = concat!(
        r#"{"op":"insert","id":"1","fields":{"title":"Rust","year":2021}}"#, "\n",
        r#"{"op":"insert","id":"2","fields":{"title":"Go"}}"#, "\n",
        r#"{"op":"update","id":"1","fields":{"year":2024}}"#, "\n",
        r#"{"op":"remove","id":"2"}"#, "\n",
        r#"{"op":"remove","id":"2"}"#, "\n",
    );

    let (replies, provider) = run(input).await;

    assert_eq!(
        replies,
        vec![
            json!({"ok": true}),
            json!({"ok": true}),
            json!({"ok": true}),
            json!({"ok": true}),
            json!({"ok": false}),
        ]
    );
    // The run only returns once queued writes are done
    assert_eq!(
        provider.document("posts", "1").unwrap(),
        fields(json!({"title": "Rust", "year": 2024, "_mid": "1"}))
    );
    assert!(provider.document("posts", "2").is_none());
}

#[tokio::test]
async fn test_malformed_lines_do_not_stop_the_loop() {
    let input = concat!(
        "not json\n",
        "\n",
        r#"{"op":"explode"}"#, "\n",
        r#"{"op":"insert","id":"1","fields":{"title":"Rust"}}"#, "\n",
        r#"{"op":"insert","id":"1","fields":{"title":"Again"}}"#, "\n",
    );

    let (mut orchestrator, _provider) = create_test_orchestrator(input).await;
    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(orchestrator.commands_handled(), 4);

    let output = String::from_utf8(orchestrator.into_output()).unwrap();
    let replies: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(replies.len(), 4);
    assert!(replies[0]["error"].as_str().unwrap().starts_with("Malformed command"));
    assert!(replies[1]["error"].is_string());
    assert_eq!(replies[2], json!({"ok": true}));
    assert!(replies[3]["error"].as_str().unwrap().contains("Duplicate"));
}

#[tokio::test]
async fn test_index_commands() {
    let input = concat!(
        r#"{"op":"add_facet","name":"year","title":"Year","terms":{"field":"year"}}"#, "\n",
        r#"{"op":"add_facets","facets":[{"name":"tag","title":"Tags","terms":{"field":"tags"}}]}"#, "\n",
        r#"{"op":"add_filter","field":"lang","term":"en"}"#, "\n",
        r#"{"op":"add_filter","index":"other","field":"lang","term":"en"}"#, "\n",
        r#"{"op":"change_property","key":"limit","value":4}"#, "\n",
        r#"{"op":"change_property","index":"other","key":"limit","value":4}"#, "\n",
        r#"{"op":"search","query":"rust"}"#, "\n",
        r#"{"op":"search","index":"other","query":"rust"}"#, "\n",
    );

    let (replies, provider) = run(input).await;

    assert_eq!(replies[0], json!({"ok": true}));
    assert_eq!(replies[1], json!({"ok": true}));
    assert_eq!(replies[2], json!({"ok": true}));
    assert_eq!(replies[3], json!({"ok": false}));
    assert_eq!(replies[4], json!({"ok": true}));
    assert!(replies[5]["error"].as_str().unwrap().contains("Index not found"));
    assert!(replies[6]["results"].is_array());
    assert!(replies[6]["resultDetails"].is_object());
    assert!(replies[7]["error"].as_str().unwrap().contains("Index not found"));

    let (_, query) = provider.last_query().unwrap();
    assert_eq!(query["size"], json!(4));
}
