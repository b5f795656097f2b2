//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// The same provider must embed both the segments at build time and the
/// question at query time, otherwise similarity scores are meaningless.
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that
/// support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::EmbeddingProvider;
///
/// let provider = DebugEmbeddingProvider::new(64);
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Must return exactly one vector per input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;
}

/// Deterministic offline embeddings for tests and the debug backend.
///
/// Each lowercase alphanumeric word is hashed into one of `dimensions`
/// buckets and the resulting term-count vector is L2-normalised. Texts that
/// share words therefore score higher under cosine similarity, which is
/// enough to make retrieval behave sensibly without a network call.
#[derive(Debug, Clone, Copy)]
pub struct DebugEmbeddingProvider {
    dimensions: usize,
}

impl DebugEmbeddingProvider {
    /// Create a provider producing vectors of the given size (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }
}

impl Default for DebugEmbeddingProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

/// FNV-1a, stable across runs and platforms.
fn stable_hash(word: &str) -> u64 {
    word.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |acc, b| (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3))
}

#[async_trait]
impl EmbeddingProvider for DebugEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = (stable_hash(&word.to_lowercase()) % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "Debug"
    }
}
