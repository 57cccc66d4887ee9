//! `usearch`-backed HNSW vector index, gated behind the `vector-hnsw`
//! feature. An alternative `VectorIndex` implementation to the default
//! brute-force `SqliteVectorIndex`. Metadata (the `Chunk` itself) lives
//! alongside the ANN index in a JSON sidecar file, since usearch only
//! stores vectors and integer keys.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::domain::Chunk;
use crate::error::{Result, StorageError};

use super::VectorIndex;

fn sidecar_path(index_path: &Path) -> PathBuf {
    index_path.with_extension("chunks.json")
}

/// HNSW-backed `VectorIndex`. Chunk metadata is kept in memory and
/// mirrored to a JSON sidecar on `open`/persisted via `flush`; the
/// vector index itself is usearch's own binary format.
pub struct HnswVectorIndex {
    path: PathBuf,
    inner: Mutex<Index>,
    chunks: Mutex<Vec<Chunk>>,
}

impl HnswVectorIndex {
    /// Opens (or creates) an HNSW index at `path`, loading any
    /// previously persisted vectors and chunk metadata.
    pub fn open(path: &Path, dimensions: usize) -> Result<Self> {
        let options = IndexOptions {
            dimensions,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            multi: false,
        };
        let inner = Index::new(&options)
            .map_err(|e| StorageError::Database(format!("failed to create HNSW index: {e}")))?;

        let chunks = if path.exists() {
            inner
                .load(path.to_string_lossy().as_ref())
                .map_err(|e| StorageError::Database(format!("failed to load HNSW index: {e}")))?;
            load_sidecar(&sidecar_path(path))?
        } else {
            inner
                .reserve(1024)
                .map_err(|e| StorageError::Database(format!("failed to reserve HNSW capacity: {e}")))?;
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(inner),
            chunks: Mutex::new(chunks),
        })
    }

    /// Persists both the vector index and the chunk-metadata sidecar.
    pub fn flush(&self) -> Result<()> {
        let inner = self.inner.lock();
        inner
            .save(self.path.to_string_lossy().as_ref())
            .map_err(|e| StorageError::Database(format!("failed to save HNSW index: {e}")))?;
        let chunks = self.chunks.lock();
        let json = serde_json::to_vec(&*chunks).map_err(StorageError::from)?;
        std::fs::write(sidecar_path(&self.path), json).map_err(|e| StorageError::SwapFailed(e.to_string()))?;
        Ok(())
    }
}

fn load_sidecar(path: &Path) -> Result<Vec<Chunk>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path).map_err(|e| StorageError::SwapFailed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::from(e).into())
}

impl VectorIndex for HnswVectorIndex {
    fn insert_chunk(&self, chunk: &Chunk) -> Result<i64> {
        let mut chunks = self.chunks.lock();
        let key = chunks.len() as u64;
        self.inner
            .lock()
            .add(key, &chunk.embedding)
            .map_err(|e| StorageError::Database(format!("failed to add vector: {e}")))?;
        chunks.push(chunk.clone());
        Ok(key as i64)
    }

    fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let chunks = self.chunks.lock();
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self
            .inner
            .lock()
            .search(query_vector, k)
            .map_err(|e| StorageError::Database(format!("HNSW search failed: {e}")))?;

        let mut results = Vec::with_capacity(matches.keys.len());
        for (key, distance) in matches.keys.iter().zip(matches.distances.iter()) {
            if let Some(chunk) = chunks.get(*key as usize) {
                results.push((chunk.clone(), *distance));
            }
        }
        Ok(results)
    }

    fn chunk_count(&self) -> Result<usize> {
        Ok(self.chunks.lock().len())
    }
}
