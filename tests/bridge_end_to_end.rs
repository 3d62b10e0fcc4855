//! Session bridge against a real in-process tool server.

use std::sync::{Arc, Mutex};
use std::thread;

use docsearch::bridge::{
    AgentTools, BridgeConfig, DuplexConnector, Status, ToolCall, ToolSession,
};
use docsearch::embedding::HashEmbedder;
use docsearch::mcp::SharedStorage;
use docsearch::storage::{SqliteStorage, Storage};

fn shared_store() -> SharedStorage {
    let mut storage = SqliteStorage::in_memory(Box::new(HashEmbedder::new())).unwrap();
    storage.init().unwrap();
    Arc::new(Mutex::new(storage))
}

fn session(storage: &SharedStorage) -> ToolSession {
    ToolSession::with_connector(
        BridgeConfig::default(),
        Arc::new(DuplexConnector::new(Arc::clone(storage))),
    )
    .unwrap()
}

#[test]
fn test_add_then_search_round_trip() {
    let storage = shared_store();
    let session = session(&storage);

    let added = session.add_document("doc1", "The Model Context Protocol connects agents to tools");
    assert_eq!(added.status, Status::Success);
    assert_eq!(
        added.text("message"),
        Some("Document 'doc1' added to collection 'documents'.")
    );

    let found = session.search_documents("Model Context Protocol", Some(1), None);
    assert!(found.is_success());
    assert_eq!(
        found.text("message"),
        Some("Search completed for query: 'Model Context Protocol'")
    );
    let results = found.text("results").unwrap();
    assert!(results.starts_with("Search Results for: 'Model Context Protocol'"));
    assert!(results.contains("Result #1 | doc1 | Relevance:"));
    assert!(!results.contains("Result #2"));

    session.cleanup();
    assert!(!session.is_connected());
}

#[test]
fn test_duplicate_add_reports_server_error() {
    let storage = shared_store();
    let session = session(&storage);

    assert!(session.add_document("doc1", "first").is_success());
    let again = session.add_document("doc1", "second");
    assert_eq!(again.status, Status::Error);
    assert!(again.error_message().unwrap().contains("already exists"));
}

#[test]
fn test_list_collections_reports_counts() {
    let storage = shared_store();
    let session = session(&storage);

    let empty = session.list_collections();
    assert!(empty.is_success());
    assert!(empty.text("collections").unwrap().contains("No collections"));

    session.add_document("a", "alpha");
    session.add_document("b", "beta");
    let listed = session.list_collections();
    let text = listed.text("collections").unwrap();
    assert!(text.contains("  - documents: 2 documents"));
}

#[test]
fn test_search_missing_collection_names_available() {
    let storage = shared_store();
    let session = session(&storage);
    session.add_document("a", "alpha");

    let response = session.search_documents("alpha", None, Some("missing"));
    assert!(response.is_success());
    let results = response.text("results").unwrap();
    assert!(results.contains("Collection 'missing' not found."));
    assert!(results.contains("documents"));
}

#[test]
fn test_concurrent_callers_share_one_session() {
    let storage = shared_store();
    let session = Arc::new(session(&storage));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let session = Arc::clone(&session);
            thread::spawn(move || session.add_document(&format!("doc{i}"), "shared text"))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_success());
    }

    let listed = session.list_collections();
    assert!(
        listed
            .text("collections")
            .unwrap()
            .contains("documents: 4 documents")
    );
    session.teardown();
    session.teardown();
}

#[test]
fn test_agent_tools_dispatch() {
    let storage = shared_store();
    let tools = AgentTools::new(Arc::new(session(&storage))).unwrap();

    let add = tools.execute(&ToolCall {
        id: "1".to_string(),
        name: "add_document".to_string(),
        arguments: r#"{"document_name":"bees","content":"Bees dance to communicate"}"#.to_string(),
    });
    assert!(!add.is_error, "{}", add.content);

    let search = tools.execute(&ToolCall {
        id: "2".to_string(),
        name: "search_documents".to_string(),
        arguments: r#"{"query":"bees dance","n_results":1}"#.to_string(),
    });
    assert!(!search.is_error);
    assert!(search.content.contains("bees"));

    tools.cleanup();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrappers_callable_from_async_context() {
    let storage = shared_store();
    let session = session(&storage);

    let response = session.list_collections();
    assert!(response.is_success());
    session.cleanup();
}
