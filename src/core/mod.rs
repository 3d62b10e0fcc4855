//! Core data model.
//!
//! Types shared by the store, the retrieval engine, and the tool server.

pub mod document;
pub mod relevance;

pub use document::{CollectionSummary, Document, Metadata, MetadataValue, SearchResult};
pub use relevance::{
    EXCERPT_LEN, TRUNCATION_MARKER, excerpt, format_relevance, relevance_from_distance,
};
