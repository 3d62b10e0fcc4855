//! `SQLite` implementation of [`Storage`].
//!
//! Embeddings are stored as little-endian `f32` blobs next to each document.
//! Queries scan the target collection and rank by cosine distance, which is
//! adequate for the collection sizes an agent tool server handles.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use super::schema::{SCHEMA_SQL, SCHEMA_VERSION};
use super::{CollectionHandle, Storage};
use crate::core::{CollectionSummary, Document, Metadata, SearchResult};
use crate::embedding::{Embedder, cosine_distance};
use crate::error::StorageError;

/// `SQLite`-backed document store.
pub struct SqliteStorage {
    conn: Connection,
    embedder: Box<dyn Embedder>,
}

impl SqliteStorage {
    /// Opens (or creates) a database file.
    ///
    /// Does not create the schema; call [`Storage::init`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or configured.
    pub fn open(path: &Path, embedder: Box<dyn Embedder>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        // The server and the seed/maintenance commands share the file.
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Self::configure(conn, embedder)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn in_memory(embedder: Box<dyn Embedder>) -> Result<Self, StorageError> {
        Self::configure(Connection::open_in_memory()?, embedder)
    }

    fn configure(conn: Connection, embedder: Box<dyn Embedder>) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn, embedder })
    }

    /// Returns the embedder used for writes and queries.
    #[must_use]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    fn document_exists(&self, collection_id: i64, id: &str) -> Result<bool, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM documents WHERE collection_id = ?1 AND doc_id = ?2")?;
        Ok(stmt.exists(params![collection_id, id])?)
    }
}

impl Storage for SqliteStorage {
    fn init(&mut self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('schema_version', ?1)",
            [SCHEMA_VERSION.to_string()],
        )?;

        let recorded: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM schema_info WHERE key = 'embedder'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match recorded {
            Some(name) if name != self.embedder.name() => {
                tracing::warn!(
                    stored = %name,
                    active = self.embedder.name(),
                    "store was written with a different embedder; distances may be meaningless"
                );
            }
            Some(_) => {}
            None => {
                self.conn.execute(
                    "INSERT INTO schema_info (key, value) VALUES ('embedder', ?1)",
                    [self.embedder.name()],
                )?;
            }
        }
        Ok(())
    }

    fn is_initialized(&self) -> Result<bool, StorageError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
                [],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_or_create_collection(&mut self, name: &str) -> Result<CollectionHandle, StorageError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, unix_now()],
        )?;
        if inserted > 0 {
            tracing::info!(collection = name, "created collection");
        }
        self.get_collection(name)?
            .ok_or_else(|| StorageError::CollectionNotFound {
                name: name.to_string(),
            })
    }

    fn get_collection(&self, name: &str) -> Result<Option<CollectionHandle>, StorageError> {
        let handle = self
            .conn
            .query_row(
                "SELECT id, name FROM collections WHERE name = ?1",
                [name],
                |row| {
                    Ok(CollectionHandle {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(handle)
    }

    fn list_collections(&self) -> Result<Vec<CollectionSummary>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, COUNT(d.doc_id)
             FROM collections c
             LEFT JOIN documents d ON d.collection_id = c.id
             GROUP BY c.id
             ORDER BY c.name",
        )?;
        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(CollectionSummary {
                name: row.get(0)?,
                count: usize::try_from(count).unwrap_or(0),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count(&self, collection: &CollectionHandle) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection_id = ?1",
            [collection.id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn add_documents(
        &mut self,
        collection: &CollectionHandle,
        documents: &[Document],
    ) -> Result<usize, StorageError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let duplicate = |id: &str| StorageError::DuplicateId {
            collection: collection.name.clone(),
            id: id.to_string(),
        };

        // Reject collisions before paying for embeddings.
        let mut seen = HashSet::with_capacity(documents.len());
        for doc in documents {
            if !seen.insert(doc.id.as_str()) || self.document_exists(collection.id, &doc.id)? {
                return Err(duplicate(&doc.id));
            }
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        let now = unix_now();

        let tx = self.conn.transaction()?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO documents (collection_id, doc_id, content, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (doc, embedding) in documents.iter().zip(&embeddings) {
                let metadata = serde_json::to_string(&doc.metadata)?;
                insert
                    .execute(params![
                        collection.id,
                        doc.id,
                        doc.content,
                        metadata,
                        encode_embedding(embedding),
                        now
                    ])
                    .map_err(|e| match e.sqlite_error_code() {
                        Some(ErrorCode::ConstraintViolation) => duplicate(&doc.id),
                        _ => StorageError::Sqlite(e),
                    })?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            collection = %collection.name,
            added = documents.len(),
            "stored documents"
        );
        Ok(documents.len())
    }

    fn get_document(
        &self,
        collection: &CollectionHandle,
        id: &str,
    ) -> Result<Option<Document>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT doc_id, content, metadata FROM documents
                 WHERE collection_id = ?1 AND doc_id = ?2",
                params![collection.id, id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, content, metadata)| {
            Ok(Document {
                id,
                content,
                metadata: serde_json::from_str(&metadata)?,
            })
        })
        .transpose()
    }

    fn delete_document(
        &mut self,
        collection: &CollectionHandle,
        id: &str,
    ) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM documents WHERE collection_id = ?1 AND doc_id = ?2",
            params![collection.id, id],
        )?;
        Ok(removed > 0)
    }

    fn query(
        &self,
        collection: &CollectionHandle,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, StorageError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query)?;

        let mut stmt = self.conn.prepare(
            "SELECT doc_id, content, metadata, embedding FROM documents
             WHERE collection_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([collection.id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, content, metadata, blob) = row?;
            let embedding = decode_embedding(&blob);
            if embedding.len() != query_vec.len() {
                return Err(StorageError::DimensionMismatch {
                    expected: query_vec.len(),
                    actual: embedding.len(),
                });
            }
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            let distance = cosine_distance(&query_vec, &embedding);
            hits.push(SearchResult::new(
                Document {
                    id,
                    content,
                    metadata,
                },
                distance,
            ));
        }

        // Stable sort keeps insertion order among equal distances.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use tempfile::TempDir;

    fn setup_storage() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory(Box::new(HashEmbedder::new())).unwrap();
        storage.init().unwrap();
        storage
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut storage = SqliteStorage::in_memory(Box::new(HashEmbedder::new())).unwrap();
        assert!(!storage.is_initialized().unwrap());
        storage.init().unwrap();
        storage.init().unwrap();
        assert!(storage.is_initialized().unwrap());
    }

    #[test]
    fn test_get_or_create_collection() {
        let mut storage = setup_storage();
        assert!(storage.get_collection("notes").unwrap().is_none());
        let first = storage.get_or_create_collection("notes").unwrap();
        let second = storage.get_or_create_collection("notes").unwrap();
        assert_eq!(first, second);
        assert_eq!(storage.get_collection("notes").unwrap(), Some(first));
    }

    #[test]
    fn test_list_collections_counts() {
        let mut storage = setup_storage();
        assert!(storage.list_collections().unwrap().is_empty());

        let x = storage.get_or_create_collection("X").unwrap();
        storage
            .add_documents(&x, &[Document::new("a", "alpha")])
            .unwrap();
        storage.get_or_create_collection("empty").unwrap();

        let listed = storage.list_collections().unwrap();
        assert_eq!(
            listed,
            vec![
                CollectionSummary {
                    name: "X".to_string(),
                    count: 1
                },
                CollectionSummary {
                    name: "empty".to_string(),
                    count: 0
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        storage
            .add_documents(&c, &[Document::new("doc1", "original")])
            .unwrap();

        let err = storage
            .add_documents(&c, &[Document::new("doc1", "replacement")])
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { ref id, .. } if id == "doc1"));

        let kept = storage.get_document(&c, "doc1").unwrap().unwrap();
        assert_eq!(kept.content, "original");
    }

    #[test]
    fn test_duplicate_within_batch_stores_nothing() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        let err = storage
            .add_documents(
                &c,
                &[
                    Document::new("a", "one"),
                    Document::new("b", "two"),
                    Document::new("a", "three"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId { .. }));
        assert_eq!(storage.count(&c).unwrap(), 0);
    }

    #[test]
    fn test_ids_unique_per_collection_only() {
        let mut storage = setup_storage();
        let a = storage.get_or_create_collection("a").unwrap();
        let b = storage.get_or_create_collection("b").unwrap();
        storage.add_documents(&a, &[Document::new("same", "x")]).unwrap();
        storage.add_documents(&b, &[Document::new("same", "y")]).unwrap();
        assert_eq!(storage.count(&a).unwrap(), 1);
        assert_eq!(storage.count(&b).unwrap(), 1);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        let doc = Document::new("m", "content")
            .with_meta("title", "Meta")
            .with_meta("rank", 2_i64);
        storage.add_documents(&c, std::slice::from_ref(&doc)).unwrap();
        assert_eq!(storage.get_document(&c, "m").unwrap(), Some(doc));
    }

    #[test]
    fn test_delete_document() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        storage.add_documents(&c, &[Document::new("gone", "bye")]).unwrap();
        assert!(storage.delete_document(&c, "gone").unwrap());
        assert!(!storage.delete_document(&c, "gone").unwrap());
        assert!(storage.get_document(&c, "gone").unwrap().is_none());
    }

    #[test]
    fn test_query_orders_by_distance() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        storage
            .add_documents(
                &c,
                &[
                    Document::new("pizza", "pizza dough fermentation in the fridge"),
                    Document::new("mcp", "the model context protocol connects agents to tools"),
                    Document::new("bees", "bees dance to share where nectar is"),
                ],
            )
            .unwrap();

        let hits = storage.query(&c, "model context protocol", 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "mcp");
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_query_limits_results() {
        let mut storage = setup_storage();
        let c = storage.get_or_create_collection("docs").unwrap();
        let docs: Vec<Document> = (0..5)
            .map(|i| Document::new(format!("d{i}"), format!("document number {i}")))
            .collect();
        storage.add_documents(&c, &docs).unwrap();

        assert_eq!(storage.query(&c, "document", 2).unwrap().len(), 2);
        assert_eq!(storage.query(&c, "document", 50).unwrap().len(), 5);
        assert!(storage.query(&c, "document", 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dims.db");
        {
            let mut storage =
                SqliteStorage::open(&path, Box::new(HashEmbedder::with_dimensions(16))).unwrap();
            storage.init().unwrap();
            let c = storage.get_or_create_collection("docs").unwrap();
            storage.add_documents(&c, &[Document::new("a", "text")]).unwrap();
        }
        let storage = SqliteStorage::open(&path, Box::new(HashEmbedder::new())).unwrap();
        let c = storage.get_collection("docs").unwrap().unwrap();
        let err = storage.query(&c, "text", 1).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DimensionMismatch {
                expected: 384,
                actual: 16
            }
        ));
    }

    #[test]
    fn test_persistence_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.db");
        {
            let mut storage = SqliteStorage::open(&path, Box::new(HashEmbedder::new())).unwrap();
            storage.init().unwrap();
            let c = storage.get_or_create_collection("documents").unwrap();
            storage.add_documents(&c, &[Document::new("doc1", "kept")]).unwrap();
        }
        let storage = SqliteStorage::open(&path, Box::new(HashEmbedder::new())).unwrap();
        assert!(storage.is_initialized().unwrap());
        assert_eq!(storage.list_collections().unwrap()[0].count, 1);
    }

    #[test]
    fn test_embedding_codec() {
        let v = vec![0.25_f32, -1.5, 3.0];
        assert_eq!(decode_embedding(&encode_embedding(&v)), v);
    }
}
