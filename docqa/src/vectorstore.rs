//! Vector store trait for nearest-neighbor search over segment embeddings.

use async_trait::async_trait;

use crate::error::Result;

/// An embedding stored under the position of its segment in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    /// Position of the segment in the owning index.
    pub ordinal: usize,
    /// The segment embedding.
    pub embedding: Vec<f32>,
}

/// A nearest-neighbor hit: the ordinal of a stored vector and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredOrdinal {
    /// Ordinal the vector was stored under.
    pub ordinal: usize,
    /// Similarity to the query (higher is more similar).
    pub score: f32,
}

/// A storage backend for segment embeddings with similarity search.
///
/// Stores only vectors keyed by ordinal; the owning
/// [`SegmentIndex`](crate::SegmentIndex) maps ordinals back to segments, so a
/// store can never surface a segment the index does not hold.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::{InMemoryVectorStore, StoredVector, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(vec![StoredVector { ordinal: 0, embedding }]).await?;
/// let hits = store.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace vectors by ordinal.
    async fn upsert(&self, vectors: Vec<StoredVector>) -> Result<()>;

    /// Return the `top_k` most similar ordinals, most similar first.
    ///
    /// Equal scores are ordered by ascending ordinal.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredOrdinal>>;

    /// Number of stored vectors.
    async fn len(&self) -> usize;

    /// Short backend name used in logs and errors.
    fn name(&self) -> &str;
}
