//! SQLite-backed `VectorIndex`: brute-force cosine/L2 ranking over a
//! persisted chunk table, using a single guarded connection and
//! BLOB-encoded embeddings.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::Chunk;
use crate::embedding::l2_distance;
use crate::error::{Result, StorageError};

use super::schema::{GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL, CURRENT_SCHEMA_VERSION};

/// A SQLite file (or in-memory database) holding the chunk store.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Opens (creating if absent) the database at `path` and ensures
    /// the schema is current.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(StorageError::from)?;
        let index = Self {
            conn: Mutex::new(conn),
        };
        index.init_schema()?;
        Ok(index)
    }

    /// Opens a scratch in-memory database. Used by tests and by
    /// ingestion runs that build an index before an atomic swap.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let index = Self {
            conn: Mutex::new(conn),
        };
        index.init_schema()?;
        Ok(index)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA_SQL).map_err(StorageError::from)?;

        let version: Option<String> = conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        if version.is_none() {
            conn.execute(SET_VERSION_SQL, params![CURRENT_SCHEMA_VERSION.to_string()])
                .map_err(StorageError::from)?;
        }
        Ok(())
    }

    fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn row_to_chunk(
        id: i64,
        citation: String,
        case_title: String,
        case_number: String,
        section: String,
        chunk_ordinal: i64,
        content: String,
        page_number: i64,
        total_pages: i64,
        document_url: String,
        source_file: String,
        embedding: Vec<f32>,
    ) -> Chunk {
        let mut chunk = Chunk::new(
            citation,
            case_title,
            case_number,
            section,
            chunk_ordinal as usize,
            content,
            page_number as u32,
            total_pages as u32,
            document_url,
            source_file,
        );
        chunk.id = Some(id);
        chunk.embedding = embedding;
        chunk
    }
}

impl super::VectorIndex for SqliteVectorIndex {
    fn insert_chunk(&self, chunk: &Chunk) -> Result<i64> {
        let conn = self.conn.lock();
        let now = crate::timestamp::now_unix_seconds();

        conn.execute(
            "INSERT INTO chunks
                (citation, case_title, case_number, section, chunk_ordinal, content,
                 page_number, total_pages, document_url, source_file, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                chunk.citation,
                chunk.case_title,
                chunk.case_number,
                chunk.section,
                chunk.chunk_ordinal as i64,
                chunk.content,
                chunk.page_number as i64,
                chunk.total_pages as i64,
                chunk.document_url,
                chunk.source_file,
                now,
            ],
        )
        .map_err(StorageError::from)?;

        let chunk_id = conn.last_insert_rowid();

        if !chunk.embedding.is_empty() {
            conn.execute(
                "INSERT OR REPLACE INTO chunk_embeddings (chunk_id, embedding, dimensions, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    chunk_id,
                    Self::encode_embedding(&chunk.embedding),
                    chunk.embedding.len() as i64,
                    now,
                ],
            )
            .map_err(StorageError::from)?;
        }

        Ok(chunk_id)
    }

    fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.citation, c.case_title, c.case_number, c.section,
                        c.chunk_ordinal, c.content, c.page_number, c.total_pages,
                        c.document_url, c.source_file, e.embedding
                 FROM chunks c
                 JOIN chunk_embeddings e ON e.chunk_id = c.id",
            )
            .map_err(StorageError::from)?;

        let mut scored: Vec<(Chunk, f32)> = stmt
            .query_map([], |row| {
                let embedding = Self::decode_embedding(&row.get::<_, Vec<u8>>(11)?);
                Ok(Self::row_to_chunk(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    embedding,
                ))
            })
            .map_err(StorageError::from)?
            .filter_map(std::result::Result::ok)
            .map(|chunk| {
                let distance = l2_distance(query_vector, &chunk.embedding);
                (chunk, distance)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.chunk_ordinal.cmp(&b.0.chunk_ordinal))
                .then_with(|| a.0.case_key().as_str().cmp(b.0.case_key().as_str()))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn chunk_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }
}
