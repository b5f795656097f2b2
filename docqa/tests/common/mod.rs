//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa::{EmbeddingProvider, RagError, Result};

/// Embeds text as keyword occurrence counts, one dimension per keyword.
///
/// Gives tests full control over which segment is nearest to a query.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    poison: Option<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            poison: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with a permanent error for any text containing `marker`.
    pub fn poisoned_by(mut self, marker: &str) -> Self {
        self.poison = Some(marker.to_string());
        self
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.poison.as_deref().is_some_and(|marker| text.contains(marker)) {
            return Err(RagError::EmbeddingError {
                provider: "Keyword".into(),
                message: "refused to embed text".into(),
                transient: false,
            });
        }
        Ok(self.keywords.iter().map(|k| text.matches(k.as_str()).count() as f32).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }

    fn name(&self) -> &str {
        "Keyword"
    }
}

/// Fails every call with an embedding error.
pub struct FailingEmbedder {
    pub transient: bool,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "Failing".into(),
            message: if self.transient { "rate limited" } else { "invalid api key" }.into(),
            transient: self.transient,
        })
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

/// Returns one embedding fewer than requested.
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "ShortBatch"
    }
}

/// Returns canned vectors whatever dimensions it declares.
///
/// Segment `i` of a batch receives `segments[i % segments.len()]`; every
/// query receives `query`.
pub struct ShapedEmbedder {
    pub declared: usize,
    pub segments: Vec<Vec<f32>>,
    pub query: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for ShapedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.query.clone())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok((0..texts.len()).map(|i| self.segments[i % self.segments.len()].clone()).collect())
    }

    fn dimensions(&self) -> usize {
        self.declared
    }

    fn name(&self) -> &str {
        "Shaped"
    }
}
