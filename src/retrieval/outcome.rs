//! Typed engine outcomes and their text rendering.
//!
//! Every engine operation returns one of these instead of an error. The
//! [`Display`](std::fmt::Display) impls produce the multi-line reports the
//! tool server sends back; the serde impls back the JSON output format.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{CollectionSummary, Document, Metadata, format_relevance};

const HEAVY_RULE_LEN: usize = 60;

/// One formatted search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// 1-based position in nearest-first order.
    pub rank: usize,
    /// Document id.
    pub id: String,
    /// Raw distance from the query.
    pub distance: f32,
    /// Relevance in `[0, 1]`.
    pub relevance: f32,
    /// Content, truncated for display.
    pub excerpt: String,
    /// Whether `excerpt` was shortened.
    pub truncated: bool,
    /// Document metadata.
    pub metadata: Metadata,
}

/// Result of a search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// One or more hits, nearest first.
    Matches {
        /// Query text.
        query: String,
        /// Collection searched.
        collection: String,
        /// Ranked hits.
        results: Vec<RankedResult>,
    },
    /// The collection exists but nothing matched.
    NoMatches {
        /// Query text.
        query: String,
        /// Collection searched.
        collection: String,
    },
    /// The collection does not exist.
    NotFound {
        /// Requested collection.
        collection: String,
        /// Collections that exist at call time.
        available: Vec<String>,
    },
    /// The request was invalid or the store failed.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

impl SearchOutcome {
    /// Returns `true` for [`SearchOutcome::Failed`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matches { query, results, .. } => {
                writeln!(f, "Search Results for: '{query}'")?;
                for result in results {
                    writeln!(f)?;
                    writeln!(f, "{}", "=".repeat(HEAVY_RULE_LEN))?;
                    writeln!(
                        f,
                        "Result #{} | {} | Relevance: {}",
                        result.rank,
                        result.id,
                        format_relevance(result.relevance)
                    )?;
                    writeln!(f, "{}", "-".repeat(HEAVY_RULE_LEN))?;
                    writeln!(f, "{}", result.excerpt)?;
                    if !result.metadata.is_empty() {
                        let json = serde_json::to_string_pretty(&result.metadata)
                            .map_err(|_| fmt::Error)?;
                        writeln!(f, "Metadata: {json}")?;
                    }
                }
                Ok(())
            }
            Self::NoMatches { query, .. } => {
                write!(f, "No documents found matching query: '{query}'")
            }
            Self::NotFound {
                collection,
                available,
            } => {
                let listed = if available.is_empty() {
                    "(none)".to_string()
                } else {
                    available.join(", ")
                };
                write!(
                    f,
                    "Collection '{collection}' not found.\nAvailable collections: {listed}"
                )
            }
            Self::Failed { message } => write!(f, "Error searching documents: {message}"),
        }
    }
}

/// Result of listing collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionListing {
    /// The store has no collections yet.
    Empty,
    /// Name/count pairs, ordered by name.
    Collections {
        /// Collection summaries.
        collections: Vec<CollectionSummary>,
    },
    /// The store failed.
    Failed {
        /// Human-readable reason.
        message: String,
    },
}

impl fmt::Display for CollectionListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(
                f,
                "No collections found in the database.\n\n\
                 Tip: Use add_document to create your first collection and add documents."
            ),
            Self::Collections { collections } => {
                write!(f, "Available Collections:")?;
                for summary in collections {
                    let plural = if summary.count == 1 { "" } else { "s" };
                    write!(
                        f,
                        "\n  - {}: {} document{plural}",
                        summary.name, summary.count
                    )?;
                }
                Ok(())
            }
            Self::Failed { message } => write!(f, "Error listing collections: {message}"),
        }
    }
}

/// Result of a write (add, batch add, delete).
///
/// Serializes as `{"status": "success", "message": ...}` or
/// `{"status": "error", "error_message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WriteOutcome {
    /// The write was applied.
    Success {
        /// Confirmation text.
        message: String,
    },
    /// The write was rejected or failed.
    Error {
        /// Reason.
        error_message: String,
    },
}

impl WriteOutcome {
    /// Returns `true` for [`WriteOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error_message: message.into(),
        }
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { message } => f.write_str(message),
            Self::Error { error_message } => write!(f, "Error: {error_message}"),
        }
    }
}

/// Result of fetching one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentLookup {
    /// The document exists.
    Success {
        /// The stored document with full content.
        document: Document,
    },
    /// Missing collection, missing id, or store failure.
    Error {
        /// Reason.
        error_message: String,
    },
}

impl fmt::Display for DocumentLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { document } => {
                writeln!(f, "Document: {}", document.id)?;
                writeln!(f, "{}", "-".repeat(HEAVY_RULE_LEN))?;
                writeln!(f, "{}", document.content)?;
                if !document.metadata.is_empty() {
                    let json = serde_json::to_string_pretty(&document.metadata)
                        .map_err(|_| fmt::Error)?;
                    writeln!(f, "Metadata: {json}")?;
                }
                Ok(())
            }
            Self::Error { error_message } => write!(f, "Error: {error_message}"),
        }
    }
}
