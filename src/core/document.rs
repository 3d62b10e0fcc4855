//! Documents, collections, and search hits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::relevance::relevance_from_distance;

/// A scalar metadata value.
///
/// Nested objects and arrays are not allowed; the store only indexes flat
/// key/value pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text value.
    Str(String),
}

impl MetadataValue {
    /// Converts a JSON value into a scalar, rejecting arrays, objects and null.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Document metadata, ordered by key for stable output.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A stored document.
///
/// Ids are unique within a collection, not across the store. Documents are
/// immutable once added; the only mutation is deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, unique within its collection.
    pub id: String,
    /// Full text content.
    pub content: String,
    /// Scalar metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Creates a document with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A collection name with its document count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Collection name.
    pub name: String,
    /// Number of documents in the collection.
    pub count: usize,
}

/// A single nearest-neighbor hit.
///
/// Not persisted. `relevance` is derived from `distance` when the hit is
/// built and is a presentation heuristic, not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document id.
    pub id: String,
    /// Full document content.
    pub content: String,
    /// Document metadata.
    pub metadata: Metadata,
    /// Distance from the query (smaller is nearer).
    pub distance: f32,
    /// Relevance in `[0, 1]`.
    pub relevance: f32,
}

impl SearchResult {
    /// Builds a hit, computing relevance from the distance.
    #[must_use]
    pub fn new(document: Document, distance: f32) -> Self {
        Self {
            id: document.id,
            content: document.content,
            metadata: document.metadata,
            distance,
            relevance: relevance_from_distance(distance),
        }
    }
}
