//! SQL schema for the chunk store backing the vector index.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Schema for a fresh database.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    citation TEXT NOT NULL,
    case_title TEXT NOT NULL,
    case_number TEXT NOT NULL,
    section TEXT NOT NULL,
    chunk_ordinal INTEGER NOT NULL,
    content TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    total_pages INTEGER NOT NULL,
    document_url TEXT NOT NULL,
    source_file TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_case_key ON chunks(citation, case_title, case_number);
CREATE INDEX IF NOT EXISTS idx_chunks_document_url ON chunks(document_url);

CREATE TABLE IF NOT EXISTS chunk_embeddings (
    chunk_id INTEGER PRIMARY KEY,
    embedding BLOB NOT NULL,
    dimensions INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (chunk_id) REFERENCES chunks(id) ON DELETE CASCADE
);
";

/// SQL to read the stored schema version, if any.
pub const GET_VERSION_SQL: &str = "SELECT value FROM schema_info WHERE key = 'version';";

/// SQL to set the schema version.
pub const SET_VERSION_SQL: &str =
    "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);";
