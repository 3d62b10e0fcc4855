//! Agent-facing tool registry over a [`ToolSession`].
//!
//! Exposes the session's wrapper functions as provider-agnostic function-
//! calling tools: a [`ToolDefinition`] per tool for the model, and
//! [`AgentTools::execute`] to dispatch the model's [`ToolCall`]s. The
//! name → handler table is declared statically and validated once when the
//! registry is built.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::response::ToolResponse;
use super::session::ToolSession;
use crate::error::BridgeError;

/// Maximum raw byte length of tool argument JSON from the model.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the dispatch table).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// The serialized [`ToolResponse`].
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

type Handler = fn(&ToolSession, &str) -> ToolResponse;

struct ToolEntry {
    definition: fn() -> ToolDefinition,
    handler: Handler,
}

const REGISTRY: [ToolEntry; 3] = [
    ToolEntry {
        definition: def_search_documents,
        handler: run_search_documents,
    },
    ToolEntry {
        definition: def_list_collections,
        handler: run_list_collections,
    },
    ToolEntry {
        definition: def_add_document,
        handler: run_add_document,
    },
];

/// The search, list and add tools bound to one session.
pub struct AgentTools {
    session: Arc<ToolSession>,
    definitions: Vec<ToolDefinition>,
}

impl AgentTools {
    /// Builds the registry over `session`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Protocol`] if two tools share a name.
    pub fn new(session: Arc<ToolSession>) -> Result<Self, BridgeError> {
        let definitions: Vec<ToolDefinition> =
            REGISTRY.iter().map(|entry| (entry.definition)()).collect();
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(BridgeError::Protocol(format!(
                    "tool '{}' registered twice",
                    def.name
                )));
            }
        }
        Ok(Self {
            session,
            definitions,
        })
    }

    /// Returns the tool definitions.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &ToolSession {
        &self.session
    }

    /// Dispatches a tool call to its handler.
    ///
    /// Never fails: unknown tools, bad arguments and remote failures all come
    /// back as error results.
    #[must_use]
    pub fn execute(&self, call: &ToolCall) -> ToolResult {
        let response = if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            ToolResponse::error(format!(
                "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                call.arguments.len()
            ))
        } else {
            match self.handler(&call.name) {
                Some(handler) => handler(&self.session, &call.arguments),
                None => ToolResponse::error(format!("unknown tool '{}'", call.name)),
            }
        };

        let is_error = !response.is_success();
        let content = serde_json::to_string(&response).unwrap_or_else(|e| {
            json!({"status": "error", "error_message": format!("serialization error: {e}")})
                .to_string()
        });
        ToolResult {
            tool_call_id: call.id.clone(),
            content,
            is_error,
        }
    }

    /// Releases the session's connection.
    pub fn cleanup(&self) {
        self.session.cleanup();
    }

    fn handler(&self, name: &str) -> Option<Handler> {
        self.definitions
            .iter()
            .position(|def| def.name == name)
            .map(|index| REGISTRY[index].handler)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_args<'a, T: Deserialize<'a>>(tool: &str, raw: &'a str) -> Result<T, ToolResponse> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw)
        .map_err(|e| ToolResponse::error(format!("invalid arguments for {tool}: {e}")))
}

fn run_search_documents(session: &ToolSession, raw: &str) -> ToolResponse {
    #[derive(Deserialize)]
    struct Args {
        query: String,
        n_results: Option<usize>,
        collection: Option<String>,
    }
    match parse_args::<Args>("search_documents", raw) {
        Ok(args) => {
            session.search_documents(&args.query, args.n_results, args.collection.as_deref())
        }
        Err(response) => response,
    }
}

fn run_list_collections(session: &ToolSession, raw: &str) -> ToolResponse {
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Args {}
    match parse_args::<Args>("list_collections", raw) {
        Ok(Args {}) => session.list_collections(),
        Err(response) => response,
    }
}

fn run_add_document(session: &ToolSession, raw: &str) -> ToolResponse {
    #[derive(Deserialize)]
    struct Args {
        document_name: String,
        content: String,
    }
    match parse_args::<Args>("add_document", raw) {
        Ok(args) => session.add_document(&args.document_name, &args.content),
        Err(response) => response,
    }
}

// ---------------------------------------------------------------------------
// Tool schema definitions
// ---------------------------------------------------------------------------

/// Defines the `search_documents` tool.
fn def_search_documents() -> ToolDefinition {
    ToolDefinition {
        name: "search_documents".to_string(),
        description: "Search the document store by meaning. Returns a ranked report of the \
                       closest documents with relevance scores."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query text."
                },
                "n_results": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Maximum number of results to return. Defaults to 5.",
                    "default": 5
                },
                "collection": {
                    "type": "string",
                    "description": "Collection to search. Defaults to 'documents'."
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

/// Defines the `list_collections` tool.
fn def_list_collections() -> ToolDefinition {
    ToolDefinition {
        name: "list_collections".to_string(),
        description: "List every collection in the document store with its document count."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

/// Defines the `add_document` tool.
fn def_add_document() -> ToolDefinition {
    ToolDefinition {
        name: "add_document".to_string(),
        description: "Add a document to the store. Fails if the id already exists.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "document_name": {
                    "type": "string",
                    "description": "Unique id for the document."
                },
                "content": {
                    "type": "string",
                    "description": "Document text."
                }
            },
            "required": ["document_name", "content"],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::config::BridgeConfig;
    use crate::bridge::connector::{Connector, ToolClient, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    struct EchoClient;

    #[async_trait]
    impl ToolClient for EchoClient {
        async fn list_tools(&self) -> Result<Vec<String>, BridgeError> {
            Ok(crate::bridge::REQUIRED_TOOLS
                .iter()
                .map(ToString::to_string)
                .collect())
        }

        async fn call(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<ToolOutput, BridgeError> {
            let text = if name == "add_document" {
                json!({"status": "success", "message": format!("added {}", arguments["document_name"])})
                    .to_string()
            } else {
                format!("{name} ok")
            };
            Ok(ToolOutput {
                text,
                is_error: false,
                structured: None,
            })
        }

        async fn close(&self) {}
    }

    struct EchoConnector;

    #[async_trait]
    impl Connector for EchoConnector {
        async fn connect(&self) -> Result<Arc<dyn ToolClient>, BridgeError> {
            Ok(Arc::new(EchoClient))
        }
    }

    fn tools() -> AgentTools {
        let session =
            ToolSession::with_connector(BridgeConfig::default(), Arc::new(EchoConnector)).unwrap();
        AgentTools::new(Arc::new(session)).unwrap()
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_definitions_match_registry() {
        let tools = tools();
        let names: Vec<&str> = tools.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["search_documents", "list_collections", "add_document"]);
        for def in tools.definitions() {
            assert!(!def.description.is_empty());
            assert_eq!(def.parameters["type"], "object");
        }
    }

    #[test]
    fn test_execute_search() {
        let result = tools().execute(&call("search_documents", r#"{"query":"bees"}"#));
        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, "call_1");
        let response: ToolResponse = serde_json::from_str(&result.content).unwrap();
        assert_eq!(response.text("results"), Some("search_documents ok"));
    }

    #[test]
    fn test_execute_list_with_empty_arguments() {
        let result = tools().execute(&call("list_collections", ""));
        assert!(!result.is_error);
        assert!(result.content.contains("list_collections ok"));
    }

    #[test]
    fn test_execute_add_passes_server_payload_through() {
        let result = tools().execute(&call(
            "add_document",
            r#"{"document_name":"doc1","content":"text"}"#,
        ));
        assert!(!result.is_error);
        assert!(result.content.contains(r#"added \"doc1\""#));
    }

    #[test]
    fn test_unknown_tool_is_error() {
        let result = tools().execute(&call("drop_tables", "{}"));
        assert!(result.is_error);
        assert!(result.content.contains("unknown tool 'drop_tables'"));
    }

    #[test]
    fn test_invalid_arguments_are_error() {
        let tools = tools();
        let result = tools.execute(&call("search_documents", r#"{"q":"x"}"#));
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments for search_documents"));

        let result = tools.execute(&call("add_document", "not json"));
        assert!(result.is_error);
    }

    #[test]
    fn test_oversized_arguments_rejected() {
        let big = format!(r#"{{"query":"{}"}}"#, "x".repeat(MAX_TOOL_ARGS_LEN));
        let result = tools().execute(&call("search_documents", &big));
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult {
            tool_call_id: "call_123".to_string(),
            content: r#"{"status":"success"}"#.to_string(),
            is_error: false,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("call_123"));
    }
}
