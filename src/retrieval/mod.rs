//! Retrieval engine.
//!
//! Runs queries and writes against a [`Storage`] and turns every result,
//! including store failures, into a typed outcome. Nothing here returns an
//! error: a missing collection or an empty result is reported to the caller
//! as data, and store failures become `Failed`/`Error` outcomes.
//!
//! Reads are side-effect free; the engine keeps no state and no cache.

mod outcome;

pub use outcome::{CollectionListing, DocumentLookup, RankedResult, SearchOutcome, WriteOutcome};

use crate::core::{Document, Metadata, SearchResult, excerpt};
use crate::error::StorageError;
use crate::storage::Storage;

/// Collection searched when the caller names none.
pub const DEFAULT_SEARCH_COLLECTION: &str = "default";

/// Collection written to when the caller names none.
pub const DEFAULT_WRITE_COLLECTION: &str = "documents";

/// Results returned when the caller gives no limit.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound on results per search.
pub const MAX_RESULTS_LIMIT: usize = 100;

/// Searches `collection` for the documents nearest to `query`.
///
/// Returns at most `max_results` hits in the store's nearest-first order;
/// the engine does not re-sort. `max_results` must be positive and is
/// capped at [`MAX_RESULTS_LIMIT`].
pub fn search<S: Storage + ?Sized>(
    storage: &S,
    query: &str,
    collection: &str,
    max_results: usize,
) -> SearchOutcome {
    if max_results == 0 {
        return SearchOutcome::Failed {
            message: "max_results must be a positive integer".to_string(),
        };
    }
    let limit = max_results.min(MAX_RESULTS_LIMIT);

    try_search(storage, query, collection, limit).unwrap_or_else(|e| {
        tracing::warn!(collection, error = %e, "search failed");
        SearchOutcome::Failed {
            message: e.to_string(),
        }
    })
}

fn try_search<S: Storage + ?Sized>(
    storage: &S,
    query: &str,
    collection: &str,
    limit: usize,
) -> Result<SearchOutcome, StorageError> {
    let Some(handle) = storage.get_collection(collection)? else {
        let available = storage
            .list_collections()?
            .into_iter()
            .map(|c| c.name)
            .collect();
        return Ok(SearchOutcome::NotFound {
            collection: collection.to_string(),
            available,
        });
    };

    let hits = storage.query(&handle, query, limit)?;
    tracing::debug!(collection, hits = hits.len(), "search complete");

    if hits.is_empty() {
        return Ok(SearchOutcome::NoMatches {
            query: query.to_string(),
            collection: collection.to_string(),
        });
    }

    let results = hits
        .into_iter()
        .enumerate()
        .map(|(i, hit)| rank(i + 1, hit))
        .collect();

    Ok(SearchOutcome::Matches {
        query: query.to_string(),
        collection: collection.to_string(),
        results,
    })
}

fn rank(position: usize, hit: SearchResult) -> RankedResult {
    let (shown, truncated) = excerpt(&hit.content);
    RankedResult {
        rank: position,
        id: hit.id,
        distance: hit.distance,
        relevance: hit.relevance,
        excerpt: shown,
        truncated,
        metadata: hit.metadata,
    }
}

/// Lists collections with their document counts.
pub fn list_collections<S: Storage + ?Sized>(storage: &S) -> CollectionListing {
    match storage.list_collections() {
        Ok(collections) if collections.is_empty() => CollectionListing::Empty,
        Ok(collections) => CollectionListing::Collections { collections },
        Err(e) => {
            tracing::warn!(error = %e, "listing collections failed");
            CollectionListing::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Adds one document, creating the collection if needed.
///
/// An id already present in the collection is rejected, never overwritten.
pub fn add_document<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    id: &str,
    content: &str,
    metadata: Metadata,
) -> WriteOutcome {
    if id.trim().is_empty() {
        return WriteOutcome::error("Failed to add document: document name must not be empty");
    }
    let document = Document {
        id: id.to_string(),
        content: content.to_string(),
        metadata,
    };
    match store(storage, collection, std::slice::from_ref(&document)) {
        Ok(_) => WriteOutcome::Success {
            message: format!("Document '{id}' added to collection '{collection}'."),
        },
        Err(e) => WriteOutcome::error(format!("Failed to add document: {e}")),
    }
}

/// Adds several documents in one all-or-nothing write.
pub fn add_documents<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    documents: &[Document],
) -> WriteOutcome {
    if documents.is_empty() {
        return WriteOutcome::error("Failed to add documents: batch is empty");
    }
    if let Some(blank) = documents.iter().position(|d| d.id.trim().is_empty()) {
        return WriteOutcome::error(format!(
            "Failed to add documents: document at index {blank} has an empty id"
        ));
    }
    match store(storage, collection, documents) {
        Ok(added) => WriteOutcome::Success {
            message: format!("Added {added} documents to collection '{collection}'."),
        },
        Err(e) => WriteOutcome::error(format!("Failed to add documents: {e}")),
    }
}

fn store<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    documents: &[Document],
) -> Result<usize, StorageError> {
    let handle = storage.get_or_create_collection(collection)?;
    storage.add_documents(&handle, documents).inspect_err(|e| {
        tracing::warn!(collection, error = %e, "add rejected");
    })
}

/// Fetches one document with its full content.
pub fn get_document<S: Storage + ?Sized>(storage: &S, collection: &str, id: &str) -> DocumentLookup {
    let found = storage.get_collection(collection).and_then(|handle| match handle {
        Some(handle) => storage.get_document(&handle, id),
        None => Ok(None),
    });
    match found {
        Ok(Some(document)) => DocumentLookup::Success { document },
        Ok(None) => DocumentLookup::Error {
            error_message: format!("Document '{id}' not found in collection '{collection}'"),
        },
        Err(e) => DocumentLookup::Error {
            error_message: format!("Failed to get document: {e}"),
        },
    }
}

/// Deletes one document.
pub fn delete_document<S: Storage + ?Sized>(
    storage: &mut S,
    collection: &str,
    id: &str,
) -> WriteOutcome {
    let removed = storage.get_collection(collection).and_then(|handle| match handle {
        Some(handle) => storage.delete_document(&handle, id),
        None => Ok(false),
    });
    match removed {
        Ok(true) => {
            tracing::info!(collection, id, "deleted document");
            WriteOutcome::Success {
                message: format!("Document '{id}' deleted from collection '{collection}'."),
            }
        }
        Ok(false) => WriteOutcome::error(format!(
            "Document '{id}' not found in collection '{collection}'"
        )),
        Err(e) => WriteOutcome::error(format!("Failed to delete document: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EXCERPT_LEN, TRUNCATION_MARKER, relevance_from_distance};
    use crate::embedding::HashEmbedder;
    use crate::storage::SqliteStorage;

    fn setup_storage() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory(Box::new(HashEmbedder::new())).unwrap();
        storage.init().unwrap();
        storage
    }

    fn seeded() -> SqliteStorage {
        let mut storage = setup_storage();
        let docs = [
            Document::new("mcp", "The Model Context Protocol connects agents and tools"),
            Document::new("bees", "Bees dance to communicate the direction of nectar"),
            Document::new("pizza", "Pizza dough improves with cold fermentation"),
            Document::new("go", "Go is an ancient board game with simple rules"),
        ];
        assert!(add_documents(&mut storage, "default", &docs).is_success());
        storage
    }

    #[test]
    fn test_search_respects_limit_and_order() {
        let storage = seeded();
        let SearchOutcome::Matches { results, .. } = search(&storage, "protocol", "default", 3)
        else {
            panic!("expected matches");
        };
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.rank, i + 1);
            assert!((r.relevance - relevance_from_distance(r.distance)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_search_missing_collection_lists_existing() {
        let mut storage = seeded();
        storage.get_or_create_collection("notes").unwrap();
        let outcome = search(&storage, "anything", "nope", 5);
        assert_eq!(
            outcome,
            SearchOutcome::NotFound {
                collection: "nope".to_string(),
                available: vec!["default".to_string(), "notes".to_string()],
            }
        );
    }

    #[test]
    fn test_search_empty_collection_is_no_matches() {
        let mut storage = setup_storage();
        storage.get_or_create_collection("empty").unwrap();
        let outcome = search(&storage, "anything", "empty", 5);
        assert!(matches!(outcome, SearchOutcome::NoMatches { .. }));
        assert!(outcome.to_string().starts_with("No documents found"));
    }

    #[test]
    fn test_search_zero_results_rejected() {
        let storage = seeded();
        assert!(search(&storage, "protocol", "default", 0).is_failure());
    }

    #[test]
    fn test_search_truncates_long_content() {
        let mut storage = setup_storage();
        let long = Document::new("long", "word ".repeat(100));
        let short = Document::new("short", "w".repeat(50));
        add_documents(&mut storage, "c", &[long, short]);

        let SearchOutcome::Matches { results, .. } = search(&storage, "word", "c", 5) else {
            panic!("expected matches");
        };
        let long = results.iter().find(|r| r.id == "long").unwrap();
        assert!(long.truncated);
        assert_eq!(
            long.excerpt.chars().count(),
            EXCERPT_LEN + TRUNCATION_MARKER.len()
        );
        let short = results.iter().find(|r| r.id == "short").unwrap();
        assert!(!short.truncated);
        assert_eq!(short.excerpt, "w".repeat(50));
    }

    #[test]
    fn test_truncated_flag_counts_chars_not_bytes() {
        let mut storage = setup_storage();
        let docs = [
            Document::new("over-by-one", "a".repeat(EXCERPT_LEN + 1)),
            Document::new("over-by-marker", "a".repeat(EXCERPT_LEN + TRUNCATION_MARKER.len())),
            Document::new("multibyte-short", "é".repeat(EXCERPT_LEN)),
            Document::new("multibyte-long", "é".repeat(EXCERPT_LEN + 1)),
        ];
        assert!(add_documents(&mut storage, "c", &docs).is_success());

        let SearchOutcome::Matches { results, .. } = search(&storage, "a", "c", 10) else {
            panic!("expected matches");
        };
        let flag = |id: &str| results.iter().find(|r| r.id == id).unwrap().truncated;
        assert!(flag("over-by-one"));
        assert!(flag("over-by-marker"));
        assert!(!flag("multibyte-short"));
        assert!(flag("multibyte-long"));
    }

    #[test]
    fn test_list_collections_empty_then_one() {
        let mut storage = setup_storage();
        let listing = list_collections(&storage);
        assert_eq!(listing, CollectionListing::Empty);
        assert!(listing.to_string().contains("No collections"));

        add_document(&mut storage, "X", "doc", "content", Metadata::new());
        let CollectionListing::Collections { collections } = list_collections(&storage) else {
            panic!("expected collections");
        };
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "X");
        assert_eq!(collections[0].count, 1);
    }

    #[test]
    fn test_add_duplicate_is_error() {
        let mut storage = setup_storage();
        let first = add_document(&mut storage, "documents", "doc1", "a", Metadata::new());
        assert!(first.is_success());
        let second = add_document(&mut storage, "documents", "doc1", "b", Metadata::new());
        let WriteOutcome::Error { error_message } = second else {
            panic!("expected error");
        };
        assert!(error_message.contains("already exists"));
    }

    #[test]
    fn test_add_empty_id_rejected() {
        let mut storage = setup_storage();
        assert!(!add_document(&mut storage, "documents", "  ", "a", Metadata::new()).is_success());
        assert!(storage.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_get_and_delete_document() {
        let mut storage = setup_storage();
        add_document(&mut storage, "documents", "doc1", "full text", Metadata::new());

        let DocumentLookup::Success { document } = get_document(&storage, "documents", "doc1")
        else {
            panic!("expected document");
        };
        assert_eq!(document.content, "full text");

        assert!(delete_document(&mut storage, "documents", "doc1").is_success());
        assert!(!delete_document(&mut storage, "documents", "doc1").is_success());
        assert!(matches!(
            get_document(&storage, "documents", "doc1"),
            DocumentLookup::Error { .. }
        ));
        assert!(!delete_document(&mut storage, "missing", "doc1").is_success());
    }

    #[test]
    fn test_end_to_end_add_then_search() {
        let mut storage = setup_storage();
        add_document(
            &mut storage,
            "documents",
            "doc1",
            "The Model Context Protocol enables standardized communication between agents and tools.",
            Metadata::new(),
        );
        let SearchOutcome::Matches { results, .. } =
            search(&storage, "protocol communication", "documents", 5)
        else {
            panic!("expected matches");
        };
        let hit = results.iter().find(|r| r.id == "doc1").unwrap();
        assert!(hit.relevance > 0.0);
    }
}
