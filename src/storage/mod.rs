//! Document store.
//!
//! [`Storage`] is the contract the retrieval engine consumes: a
//! collection-partitioned document store with embedding-based
//! nearest-neighbor queries. [`SqliteStorage`] is the persistent
//! implementation shared by the tool server and the maintenance commands.

mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::core::{CollectionSummary, Document, SearchResult};
use crate::error::StorageError;

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".docsearch/docsearch.db";

/// Handle to an existing collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    /// Row id of the collection.
    pub id: i64,
    /// Collection name.
    pub name: String,
}

/// Collection-partitioned document store with nearest-neighbor search.
///
/// Document ids are unique per collection. Implementations provide their
/// own consistency; callers add no locking around individual calls.
pub trait Storage {
    /// Creates the schema if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    fn init(&mut self) -> Result<(), StorageError>;

    /// Returns `true` once [`Storage::init`] has run against this store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be inspected.
    fn is_initialized(&self) -> Result<bool, StorageError>;

    /// Returns the named collection, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error only on storage failure; a missing name is not an error.
    fn get_or_create_collection(&mut self, name: &str) -> Result<CollectionHandle, StorageError>;

    /// Returns the named collection, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn get_collection(&self, name: &str) -> Result<Option<CollectionHandle>, StorageError>;

    /// Lists all collections with document counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn list_collections(&self) -> Result<Vec<CollectionSummary>, StorageError>;

    /// Number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn count(&self, collection: &CollectionHandle) -> Result<usize, StorageError>;

    /// Adds documents atomically.
    ///
    /// Either every document is stored or none is. An id already present in
    /// the collection, or repeated within `documents`, fails the whole call
    /// with [`StorageError::DuplicateId`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateId`] on id collisions, or an error
    /// on embedding or storage failure.
    fn add_documents(
        &mut self,
        collection: &CollectionHandle,
        documents: &[Document],
    ) -> Result<usize, StorageError>;

    /// Fetches a document by id.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn get_document(
        &self,
        collection: &CollectionHandle,
        id: &str,
    ) -> Result<Option<Document>, StorageError>;

    /// Deletes a document by id. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn delete_document(
        &mut self,
        collection: &CollectionHandle,
        id: &str,
    ) -> Result<bool, StorageError>;

    /// Returns up to `k` documents nearest to `query`, nearest first.
    ///
    /// Fewer than `k` hits are returned when the collection is smaller.
    ///
    /// # Errors
    ///
    /// Returns an error on embedding or storage failure.
    fn query(
        &self,
        collection: &CollectionHandle,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, StorageError>;
}
