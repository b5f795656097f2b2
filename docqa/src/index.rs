//! Per-upload semantic index over document segments.
//!
//! A [`SegmentIndex`] is built once from one or more [`Document`]s and is
//! read-only afterwards: every query only reads from it, so a single index
//! can serve concurrent questions behind an `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Document, SearchResult, Segment};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::fingerprint;
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::{StoredVector, VectorStore};

/// Embedding-backed nearest-neighbor index over the segments of its documents.
pub struct SegmentIndex {
    documents: Vec<Document>,
    /// All segments in document order; position is the store ordinal.
    segments: Vec<Segment>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    fingerprint: String,
}

impl SegmentIndex {
    /// Build an index backed by an [`InMemoryVectorStore`].
    ///
    /// # Errors
    ///
    /// See [`SegmentIndex::build_with_store`].
    pub async fn build(
        documents: Vec<Document>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        Self::build_with_store(documents, embedder, Arc::new(InMemoryVectorStore::new())).await
    }

    /// Embed every segment of `documents` and insert it into `store`.
    ///
    /// Documents are embedded one after another, one batch per document.
    /// Any failure aborts the build; nothing partially built is returned.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidDocument`] if the same document is supplied twice.
    /// - [`RagError::VectorStoreError`] if `store` already holds vectors.
    /// - [`RagError::EmbeddingError`] if the provider returns the wrong number
    ///   of embeddings, or one that does not match its declared dimensions or
    ///   holds non-finite values.
    /// - [`RagError::PipelineError`] if embedding or storage fails; the
    ///   transient flag of the underlying error is preserved.
    pub async fn build_with_store(
        documents: Vec<Document>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = documents.iter().find(|d| !seen.insert(d.id.as_str())) {
            return Err(RagError::InvalidDocument(format!(
                "document '{}' ({}) supplied more than once",
                dup.name, dup.id
            )));
        }
        if store.len().await > 0 {
            return Err(RagError::VectorStoreError {
                backend: store.name().to_string(),
                message: "an index must be built into an empty store".to_string(),
            });
        }

        let mut segments = Vec::new();
        for document in &documents {
            if document.segments.is_empty() {
                debug!(document.id = %document.id, "document has no segments");
                continue;
            }

            let texts: Vec<&str> = document.segments.iter().map(|s| s.text.as_str()).collect();
            let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "embedding failed during build");
                e.into_pipeline(format!("embedding failed for document '{}'", document.name))
            })?;

            if embeddings.len() != texts.len() {
                return Err(RagError::EmbeddingError {
                    provider: embedder.name().to_string(),
                    message: format!(
                        "expected {} embeddings for document '{}', received {}",
                        texts.len(),
                        document.name,
                        embeddings.len()
                    ),
                    transient: false,
                });
            }
            for (segment, embedding) in document.segments.iter().zip(&embeddings) {
                check_embedding(embedder.as_ref(), embedding, &segment.source_id)?;
            }

            let base = segments.len();
            let vectors = embeddings
                .into_iter()
                .enumerate()
                .map(|(i, embedding)| StoredVector { ordinal: base + i, embedding })
                .collect();
            store.upsert(vectors).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "upsert failed during build");
                e.into_pipeline(format!("upsert failed for document '{}'", document.name))
            })?;

            segments.extend(document.segments.iter().cloned());
            info!(
                document.id = %document.id,
                segment_count = document.segments.len(),
                "indexed document"
            );
        }

        let fingerprint = fingerprint::index_fingerprint(&documents);
        Ok(Self { documents, segments, embedder, store, fingerprint })
    }

    /// Return the `k` segments most similar to `query`, most similar first.
    ///
    /// Ties are broken by original segment order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the query cannot be embedded or
    /// the store search fails, and [`RagError::EmbeddingError`] if the query
    /// embedding does not match the provider's declared dimensions.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.segments.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during search");
            e.into_pipeline("query embedding failed")
        })?;
        check_embedding(self.embedder.as_ref(), &query_embedding, "query")?;

        let hits = self.store.search(&query_embedding, k).await.map_err(|e| {
            error!(error = %e, "vector store search failed");
            e.into_pipeline("search failed")
        })?;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|hit| {
                self.segments
                    .get(hit.ordinal)
                    .map(|segment| SearchResult { segment: segment.clone(), score: hit.score })
            })
            .collect();

        debug!(result_count = results.len(), k, "search completed");
        Ok(results)
    }

    /// The documents this index was built from.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// All indexed segments in document order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Fingerprint of the indexed documents and their chunking parameters.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of indexed segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the index holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Reject an embedding whose size differs from the provider's declared
/// dimensions or that holds NaN or infinite components.
fn check_embedding(embedder: &dyn EmbeddingProvider, embedding: &[f32], what: &str) -> Result<()> {
    let expected = embedder.dimensions();
    let problem = if embedding.len() != expected {
        format!("embedding for {what} has {} dimensions, expected {expected}", embedding.len())
    } else if embedding.iter().any(|x| !x.is_finite()) {
        format!("embedding for {what} has non-finite components")
    } else {
        return Ok(());
    };
    error!(provider = embedder.name(), error = %problem, "invalid embedding");
    Err(RagError::EmbeddingError {
        provider: embedder.name().to_string(),
        message: problem,
        transient: false,
    })
}
