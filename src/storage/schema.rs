//! `SQLite` schema for the document store.

/// Current schema version, stored in `schema_info`.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema creation script. Idempotent.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    collection_id INTEGER NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    doc_id TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (collection_id, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection_id);
";
