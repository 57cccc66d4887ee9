//! Embedding client: maps chunk/query text to a fixed-dimension
//! vector. Provides a hash-based fallback for test and offline use, and
//! an optional `fastembed`-backed semantic implementation.

mod fallback;

#[cfg(feature = "fastembed-embeddings")]
mod fastembed_impl;

pub use fallback::FallbackEmbedder;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

use crate::error::Result;

/// Default embedding dimensionality (all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Maps text to an embedding vector. Implementations must be
/// thread-safe to support parallel embedding during ingestion.
pub trait Embedder: Send + Sync {
    /// Dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embeds a single piece of text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts. The default calls `embed` sequentially;
    /// implementations may override for batch efficiency.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Constructs the default embedder for the active feature set: the
/// `fastembed`-backed implementation when `fastembed-embeddings` is
/// enabled, the deterministic hash-based fallback otherwise.
#[cfg(feature = "fastembed-embeddings")]
pub fn create_embedder() -> Result<Box<dyn Embedder>> {
    Ok(Box::new(FastEmbedEmbedder::new()?))
}

/// Constructs the default embedder for the active feature set: the
/// `fastembed`-backed implementation when `fastembed-embeddings` is
/// enabled, the deterministic hash-based fallback otherwise.
#[cfg(not(feature = "fastembed-embeddings"))]
pub fn create_embedder() -> Result<Box<dyn Embedder>> {
    Ok(Box::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS)))
}

/// Cosine similarity between two equal-length vectors, in `[-1, 1]`.
/// Returns `0.0` for mismatched lengths or a zero-magnitude vector.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Euclidean (L2) distance between two equal-length vectors. Used as
/// the Vector Index's ranking distance (lower = closer), since cosine
/// similarity over the fallback embedder's normalized vectors and L2
/// distance induce the same ordering.
#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_different_lengths() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance_identical_is_zero() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((l2_distance(&a, &a)).abs() < 1e-6);
    }

    #[test]
    fn test_create_embedder_produces_expected_dimensions() {
        let embedder = create_embedder().unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_embed_batch_default_impl() {
        let embedder = create_embedder().unwrap();
        let texts = vec!["hello", "world", "test"];
        let embeddings = embedder.embed_batch(&texts).unwrap();
        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), embedder.dimensions());
        }
    }
}
