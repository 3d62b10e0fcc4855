//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for the `search_documents` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Natural-language search text.
    pub query: String,

    /// Collection to search (defaults to `"default"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Maximum number of results, 1 to 100 (defaults to 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
}

/// Parameters for the `add_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddDocumentParams {
    /// Unique id for the document within its collection.
    pub document_name: String,

    /// Document text.
    pub content: String,

    /// Collection to add to (defaults to `"documents"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Scalar key/value pairs stored with the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Parameters for tools that address a single document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentRefParams {
    /// Document id.
    pub document_name: String,

    /// Collection holding the document (defaults to `"documents"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// One entry of an `add_documents_batch` call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchDocument {
    /// Unique id for the document within its collection.
    pub id: String,

    /// Document text.
    pub content: String,

    /// Scalar key/value pairs stored with the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Parameters for the `add_documents_batch` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchParams {
    /// Documents to add; the batch is rejected as a whole on any duplicate id.
    pub documents: Vec<BatchDocument>,

    /// Collection to add to (defaults to `"documents"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}
