//! Embeddings: the `Embedder` adapter over `fastembed`, a content-hash
//! keyed `EmbeddingCache` (spec §4.6) backed by SQLite, and the cosine
//! similarity helper the SearchBackend's hybrid ranking and backfill use
//! (spec §4.7/4.8).
//!
//! The teacher's `semantic` module clustered these vectors into an
//! IVFFlat index over memory-mapped segments for sub-linear search at
//! scale; this crate's SearchBackend holds its vector half as a plain
//! `HashMap<String, Vec<f32>>` (see [`crate::search`]) — the clustering
//! and mmap machinery is the part of that design this crate does not
//! carry forward (see DESIGN.md).

mod cache;
mod embedder;

pub use cache::{compute_content_hash, EmbeddingCache, EmbeddingCacheError};
pub use embedder::{Embedder, EmbedderError, FastEmbedEmbedder};
#[cfg(test)]
pub use embedder::StubEmbedder;

/// Cosine similarity between two vectors of equal length. Returns `0.0`
/// for a zero-magnitude vector rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_handled() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
