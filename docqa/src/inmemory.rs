//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], an exact flat-scan store
//! backed by a `BTreeMap` protected by a `tokio::sync::RwLock`. Any number of
//! queries may search it concurrently once it has been filled.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RagError, Result};
use crate::vectorstore::{ScoredOrdinal, StoredVector, VectorStore};

/// An in-memory vector store using cosine similarity for search.
///
/// Vectors are kept in ordinal order, so a stable sort by score yields the
/// tie-breaking required by [`VectorStore::search`].
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    vectors: RwLock<BTreeMap<usize, Vec<f32>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn error(message: String) -> RagError {
        RagError::VectorStoreError { backend: "InMemory".to_string(), message }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Accumulates in `f64` so large finite components cannot overflow the
/// norms. Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f32
}

fn is_finite(embedding: &[f32]) -> bool {
    embedding.iter().all(|x| x.is_finite())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, vectors: Vec<StoredVector>) -> Result<()> {
        let mut store = self.vectors.write().await;
        let expected = store
            .values()
            .next()
            .map(Vec::len)
            .or_else(|| vectors.first().map(|v| v.embedding.len()));
        for vector in &vectors {
            if !is_finite(&vector.embedding) {
                return Err(Self::error(format!(
                    "embedding for ordinal {} has non-finite components",
                    vector.ordinal
                )));
            }
            let Some(dims) = expected else { continue };
            if vector.embedding.len() != dims {
                return Err(Self::error(format!(
                    "embedding for ordinal {} has {} dimensions, expected {dims}",
                    vector.ordinal,
                    vector.embedding.len()
                )));
            }
        }
        for vector in vectors {
            store.insert(vector.ordinal, vector.embedding);
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredOrdinal>> {
        if !is_finite(embedding) {
            return Err(Self::error("query has non-finite components".to_string()));
        }
        let store = self.vectors.read().await;
        if let Some(dims) = store.values().next().map(Vec::len) {
            if dims != embedding.len() {
                return Err(Self::error(format!(
                    "query has {} dimensions, store holds {dims}",
                    embedding.len()
                )));
            }
        }

        let mut scored: Vec<ScoredOrdinal> = store
            .iter()
            .map(|(ordinal, stored)| ScoredOrdinal {
                ordinal: *ordinal,
                score: cosine_similarity(stored, embedding),
            })
            .collect();

        // Stable: equal scores keep ascending ordinal order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.vectors.read().await.len()
    }

    fn name(&self) -> &str {
        "InMemory"
    }
}
