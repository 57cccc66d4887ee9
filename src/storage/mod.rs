//! Vector index storage: persists `{embedding, chunk text, metadata}`
//! and supports top-k approximate nearest neighbor search.
//!
//! Default backend is SQLite-backed brute-force cosine/L2 ranking
//! (`SqliteVectorIndex`). Any structure satisfying the
//! `search(query_vector, k)` contract is a valid implementation; an
//! HNSW-backed alternative can sit behind the same trait under the
//! `vector-hnsw` feature without touching callers.

#[cfg(feature = "vector-hnsw")]
mod hnsw;
mod schema;
mod sqlite;

#[cfg(feature = "vector-hnsw")]
pub use hnsw::HnswVectorIndex;
pub use sqlite::SqliteVectorIndex;

use crate::domain::Chunk;
use crate::error::Result;

/// Contract exposed to the retriever: nearest-neighbor search over
/// persisted chunk embeddings, plus the writes the ingestion pipeline
/// needs to populate the index.
pub trait VectorIndex: Send + Sync {
    /// Inserts one chunk (with its embedding already set) and returns
    /// its assigned id.
    fn insert_chunk(&self, chunk: &Chunk) -> Result<i64>;

    /// Inserts a batch of chunks, returning their assigned ids in
    /// order.
    fn insert_chunks_batch(&self, chunks: &[Chunk]) -> Result<Vec<i64>> {
        chunks.iter().map(|c| self.insert_chunk(c)).collect()
    }

    /// Returns the `k` chunks nearest `query_vector`, ascending by
    /// distance (lower = closer). Distances are non-negative.
    fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>>;

    /// Total number of chunks persisted.
    fn chunk_count(&self) -> Result<usize>;
}
