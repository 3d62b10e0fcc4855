//! MCP server implementation for docsearch.
//!
//! Exposes the retrieval engine as MCP tools and the help text as an MCP
//! resource. Store access runs on the blocking pool behind a mutex, so each
//! tool call completes before the next one touches the store.

use std::sync::{Arc, Mutex};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParams, ProtocolVersion, RawResource, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::{Document, Metadata, MetadataValue};
use crate::error::StorageError;
use crate::retrieval::{
    self, DEFAULT_MAX_RESULTS, DEFAULT_SEARCH_COLLECTION, DEFAULT_WRITE_COLLECTION, WriteOutcome,
};
use crate::storage::SqliteStorage;

use super::help::{HELP_NAME, HELP_TEXT, HELP_URI};
use super::params::{AddDocumentParams, BatchParams, DocumentRefParams, SearchParams};

/// Store shared by every session of one server process.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Docsearch MCP server.
///
/// Cheap to clone: clones share the same store.
#[derive(Clone)]
pub struct DocSearchMcpServer {
    tool_router: ToolRouter<Self>,
    storage: SharedStorage,
}

#[tool_router]
impl DocSearchMcpServer {
    /// Semantic search over one collection.
    #[tool(
        name = "search_documents",
        description = "Search a document collection by meaning. Returns a ranked report of the closest documents with relevance scores and excerpts. Defaults: collection \"default\", max_results 5 (maximum 100)."
    )]
    async fn search_documents(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let collection = params
            .collection
            .unwrap_or_else(|| DEFAULT_SEARCH_COLLECTION.to_string());
        // Negative limits fall through to the engine's positive-limit check.
        let max_results = params
            .max_results
            .map_or(Ok(DEFAULT_MAX_RESULTS), usize::try_from)
            .unwrap_or(0);
        tracing::debug!(collection = %collection, max_results, "search_documents");

        let query = params.query;
        let outcome = self
            .with_store(move |storage| {
                retrieval::search(&*storage, &query, &collection, max_results)
            })
            .await;

        Ok(match outcome {
            Ok(outcome) if outcome.is_failure() => text_error(outcome.to_string()),
            Ok(outcome) => CallToolResult::success(vec![Content::text(outcome.to_string())]),
            Err(message) => text_error(format!("Error searching documents: {message}")),
        })
    }

    /// Lists collections with document counts.
    #[tool(
        name = "list_collections",
        description = "List every document collection with the number of documents it holds."
    )]
    async fn list_collections(&self) -> Result<CallToolResult, McpError> {
        let listing = self
            .with_store(|storage| retrieval::list_collections(&*storage))
            .await;

        Ok(match listing {
            Ok(listing @ retrieval::CollectionListing::Failed { .. }) => {
                text_error(listing.to_string())
            }
            Ok(listing) => CallToolResult::success(vec![Content::text(listing.to_string())]),
            Err(message) => text_error(format!("Error listing collections: {message}")),
        })
    }

    /// Adds one document.
    #[tool(
        name = "add_document",
        description = "Add a document to a collection (default \"documents\"), creating the collection if needed. Rejects an id that already exists. Returns JSON {status, message | error_message}."
    )]
    async fn add_document(
        &self,
        Parameters(params): Parameters<AddDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let collection = write_collection(params.collection);
        let metadata = match metadata_from_json(params.metadata) {
            Ok(metadata) => metadata,
            Err(message) => {
                return json_result(&WriteOutcome::error(format!(
                    "Failed to add document: {message}"
                )));
            }
        };

        let (id, content) = (params.document_name, params.content);
        let outcome = self
            .with_store(move |storage| {
                retrieval::add_document(storage, &collection, &id, &content, metadata)
            })
            .await
            .unwrap_or_else(|message| {
                WriteOutcome::error(format!("Failed to add document: {message}"))
            });

        json_result(&outcome)
    }

    /// Adds several documents at once.
    #[tool(
        name = "add_documents_batch",
        description = "Add several documents to a collection in one all-or-nothing write. Any id that already exists, or repeats within the batch, rejects the whole batch. Returns JSON {status, message | error_message}."
    )]
    async fn add_documents_batch(
        &self,
        Parameters(params): Parameters<BatchParams>,
    ) -> Result<CallToolResult, McpError> {
        let collection = write_collection(params.collection);
        let mut documents = Vec::with_capacity(params.documents.len());
        for entry in params.documents {
            match metadata_from_json(entry.metadata) {
                Ok(metadata) => documents.push(Document {
                    id: entry.id,
                    content: entry.content,
                    metadata,
                }),
                Err(message) => {
                    return json_result(&WriteOutcome::error(format!(
                        "Failed to add documents: {message}"
                    )));
                }
            }
        }

        let outcome = self
            .with_store(move |storage| retrieval::add_documents(storage, &collection, &documents))
            .await
            .unwrap_or_else(|message| {
                WriteOutcome::error(format!("Failed to add documents: {message}"))
            });

        json_result(&outcome)
    }

    /// Fetches one document in full.
    #[tool(
        name = "get_document",
        description = "Fetch one document by id with its full content and metadata. Returns JSON {status, document | error_message}."
    )]
    async fn get_document(
        &self,
        Parameters(params): Parameters<DocumentRefParams>,
    ) -> Result<CallToolResult, McpError> {
        let collection = write_collection(params.collection);
        let id = params.document_name;
        let lookup = self
            .with_store(move |storage| retrieval::get_document(&*storage, &collection, &id))
            .await
            .unwrap_or_else(|message| retrieval::DocumentLookup::Error {
                error_message: format!("Failed to get document: {message}"),
            });

        json_result(&lookup)
    }

    /// Deletes one document.
    #[tool(
        name = "delete_document",
        description = "Delete one document by id. Returns JSON {status, message | error_message}."
    )]
    async fn delete_document(
        &self,
        Parameters(params): Parameters<DocumentRefParams>,
    ) -> Result<CallToolResult, McpError> {
        let collection = write_collection(params.collection);
        let id = params.document_name;
        let outcome = self
            .with_store(move |storage| retrieval::delete_document(storage, &collection, &id))
            .await
            .unwrap_or_else(|message| {
                WriteOutcome::error(format!("Failed to delete document: {message}"))
            });

        json_result(&outcome)
    }
}

#[tool_handler]
impl ServerHandler for DocSearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "docsearch".to_string(),
                title: Some("Document Search MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Semantic document search over persistent collections. Use `search_documents` \
                 to query, `list_collections` to discover collections and `add_document` to \
                 store new text. Read `search://help` for the full tool list."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: vec![help_resource()],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if uri != HELP_URI {
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {uri}. Available: {HELP_URI}"),
                None,
            ));
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(HELP_TEXT, uri)],
        })
    }
}

impl DocSearchMcpServer {
    /// Creates a server that owns `storage`.
    ///
    /// The store must already be initialized.
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self::with_shared(Arc::new(Mutex::new(storage)))
    }

    /// Creates a server over a store shared with other server instances.
    ///
    /// Used by the HTTP transport, which builds one server per session.
    #[must_use]
    pub fn with_shared(storage: SharedStorage) -> Self {
        Self {
            tool_router: Self::tool_router(),
            storage,
        }
    }

    /// Returns the shared store handle.
    #[must_use]
    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Runs `op` against the store on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, String>
    where
        F: FnOnce(&mut SqliteStorage) -> T + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let mut guard = storage
                .lock()
                .map_err(|_| StorageError::Poisoned.to_string())?;
            Ok(op(&mut guard))
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            format!("task join error: {e}")
        })?
    }
}

fn help_resource() -> Resource {
    let mut raw = RawResource::new(HELP_URI, HELP_NAME);
    raw.description = Some("Tool names and one-line descriptions".to_string());
    raw.mime_type = Some("text/plain".to_string());
    raw.no_annotation()
}

fn write_collection(collection: Option<String>) -> String {
    collection.unwrap_or_else(|| DEFAULT_WRITE_COLLECTION.to_string())
}

fn text_error(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

fn json_result<T: Serialize>(payload: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(payload)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Converts a JSON object of scalars into document metadata.
fn metadata_from_json(map: Option<Map<String, Value>>) -> Result<Metadata, String> {
    let mut metadata = Metadata::new();
    for (key, value) in map.into_iter().flatten() {
        let scalar = MetadataValue::from_json(&value).ok_or_else(|| {
            format!("metadata value for '{key}' must be a string, number or boolean")
        })?;
        metadata.insert(key, scalar);
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::storage::Storage;
    use rmcp::model::CallToolRequestParams;
    use rmcp::service::RunningService;
    use rmcp::{RoleClient, ServiceExt};
    use serde_json::json;

    fn test_server() -> DocSearchMcpServer {
        let mut storage = SqliteStorage::in_memory(Box::new(HashEmbedder::new())).unwrap();
        storage.init().unwrap();
        DocSearchMcpServer::new(storage)
    }

    async fn connect(server: DocSearchMcpServer) -> RunningService<RoleClient, ()> {
        let (server_io, client_io) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let running = server.serve(server_io).await.unwrap();
            let _ = running.waiting().await;
        });
        ().serve(client_io).await.unwrap()
    }

    async fn call(
        client: &RunningService<RoleClient, ()>,
        name: &'static str,
        args: Value,
    ) -> (bool, String) {
        let result = client
            .call_tool(CallToolRequestParams {
                name: name.into(),
                arguments: args.as_object().cloned(),
                task: None,
                meta: None,
            })
            .await
            .unwrap();
        let text = result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect::<Vec<_>>()
            .join("\n");
        (result.is_error.unwrap_or(false), text)
    }

    #[test]
    fn test_metadata_from_json_rejects_nested() {
        let ok = json!({"title": "MCP", "year": 2024, "draft": false});
        let metadata = metadata_from_json(ok.as_object().cloned()).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata["year"], MetadataValue::Int(2024));

        let nested = json!({"tags": ["a", "b"]});
        let err = metadata_from_json(nested.as_object().cloned()).unwrap_err();
        assert!(err.contains("tags"));

        assert!(metadata_from_json(None).unwrap().is_empty());
    }

    #[test]
    fn test_help_resource_shape() {
        let resource = help_resource();
        assert_eq!(resource.uri, HELP_URI);
        for tool in ["search_documents", "list_collections", "add_document"] {
            assert!(HELP_TEXT.contains(tool));
        }
    }

    #[tokio::test]
    async fn test_lists_all_tools() {
        let client = connect(test_server()).await;
        let mut names: Vec<String> = client
            .list_all_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "add_document",
                "add_documents_batch",
                "delete_document",
                "get_document",
                "list_collections",
                "search_documents",
            ]
        );
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_add_then_search() {
        let client = connect(test_server()).await;

        let (is_error, text) = call(
            &client,
            "add_document",
            json!({
                "document_name": "doc1",
                "content": "The Model Context Protocol enables standardized communication."
            }),
        )
        .await;
        assert!(!is_error);
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload["status"], "success");

        let (is_error, text) = call(
            &client,
            "search_documents",
            json!({"query": "protocol communication", "collection": "documents"}),
        )
        .await;
        assert!(!is_error);
        assert!(text.starts_with("Search Results for: 'protocol communication'"));
        assert!(text.contains("Result #1 | doc1 | Relevance:"));

        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_add_reports_error_status() {
        let client = connect(test_server()).await;
        let args = json!({"document_name": "doc1", "content": "first"});
        call(&client, "add_document", args.clone()).await;
        let (_, text) = call(&client, "add_document", args).await;
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload["status"], "error");
        assert!(
            payload["error_message"]
                .as_str()
                .unwrap()
                .contains("already exists")
        );
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_search_missing_collection_is_informational() {
        let client = connect(test_server()).await;
        let (is_error, text) = call(
            &client,
            "search_documents",
            json!({"query": "anything", "collection": "nope"}),
        )
        .await;
        assert!(!is_error);
        assert!(text.contains("Collection 'nope' not found."));
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_search_rejects_non_positive_limit() {
        let client = connect(test_server()).await;
        for limit in [0, -3] {
            let (is_error, text) = call(
                &client,
                "search_documents",
                json!({"query": "q", "max_results": limit}),
            )
            .await;
            assert!(is_error);
            assert!(text.starts_with("Error searching documents"));
        }
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_collections_empty_store() {
        let client = connect(test_server()).await;
        let (is_error, text) = call(&client, "list_collections", json!({})).await;
        assert!(!is_error);
        assert!(text.starts_with("No collections found"));
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_get_delete() {
        let client = connect(test_server()).await;
        let (_, text) = call(
            &client,
            "add_documents_batch",
            json!({
                "collection": "notes",
                "documents": [
                    {"id": "a", "content": "alpha", "metadata": {"n": 1}},
                    {"id": "b", "content": "beta"}
                ]
            }),
        )
        .await;
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload["status"], "success");

        let (_, text) = call(
            &client,
            "get_document",
            json!({"document_name": "a", "collection": "notes"}),
        )
        .await;
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload["document"]["content"], "alpha");
        assert_eq!(payload["document"]["metadata"]["n"], 1);

        let (_, text) = call(
            &client,
            "delete_document",
            json!({"document_name": "a", "collection": "notes"}),
        )
        .await;
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload["status"], "success");

        let (_, text) = call(&client, "list_collections", json!({})).await;
        assert!(text.contains("notes: 1 document"));
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_lists_help_resource() {
        let client = connect(test_server()).await;
        let resources = client.list_all_resources().await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, HELP_URI);
        client.cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let server = test_server();
        let other = server.clone();
        server
            .with_store(|s| {
                retrieval::add_document(s, "X", "doc", "text", Metadata::new());
            })
            .await
            .unwrap();
        let count = other
            .with_store(|s| s.list_collections().unwrap().len())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
