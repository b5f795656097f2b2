//! Per-user conversation state.
//!
//! A [`ChatSession`] owns everything that lives for the duration of one
//! uploaded document: the conversation, the built index and memoized
//! answers. Uploading a different document starts over.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{AnswerCache, IndexCache};
use crate::chunking::Chunker;
use crate::document::{Document, Page, QueryResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::fingerprint;
use crate::index::SegmentIndex;
use crate::pipeline::{CannedQuery, QueryPipeline};

/// First message of every conversation.
pub const GREETING: &str = "Ask me a question about the tender material.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The answering system.
    Assistant,
}

/// One entry of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Conversation, index cache and answer cache for one uploaded document.
pub struct ChatSession {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    messages: Vec<ChatMessage>,
    index_cache: IndexCache,
    answer_cache: AnswerCache,
    current: Option<Arc<SegmentIndex>>,
}

impl ChatSession {
    /// Create an empty session that segments with `chunker` and indexes
    /// with `embedder`.
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            chunker,
            embedder,
            messages: vec![ChatMessage::assistant(GREETING)],
            index_cache: IndexCache::new(),
            answer_cache: AnswerCache::new(),
            current: None,
        }
    }

    /// Segment and index an upload, reusing the cached index when the same
    /// content was loaded before.
    ///
    /// A different document replaces the current one: the conversation and
    /// both caches are reset, but only after its index has been built, so a
    /// failed upload leaves the previous document usable.
    ///
    /// # Errors
    ///
    /// Propagates segmentation and index-build errors.
    pub async fn load_document(
        &mut self,
        name: impl Into<String>,
        pages: &[Page],
    ) -> Result<Arc<SegmentIndex>> {
        let document = Document::from_pages(name, pages, self.chunker.as_ref())?;
        let key = fingerprint::index_fingerprint(std::slice::from_ref(&document));

        if let Some(index) = self.index_cache.get(&key) {
            debug!(document.id = %document.id, "reusing cached index");
            self.current = Some(Arc::clone(&index));
            return Ok(index);
        }

        let document_id = document.id.clone();
        let index =
            Arc::new(SegmentIndex::build(vec![document], Arc::clone(&self.embedder)).await?);

        self.reset();
        let index = self.index_cache.insert(index);
        self.current = Some(Arc::clone(&index));
        info!(document.id = %document_id, segment_count = index.len(), "document loaded");
        Ok(index)
    }

    /// The index of the current document, if one is loaded.
    pub fn current_index(&self) -> Option<&Arc<SegmentIndex>> {
        self.current.as_ref()
    }

    /// The conversation so far, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of memoized answers.
    pub fn cached_answers(&self) -> usize {
        self.answer_cache.len()
    }

    /// Forget the current document, the conversation and both caches.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(GREETING)];
        self.index_cache.clear();
        self.answer_cache.clear();
        self.current = None;
    }

    /// Answer `question` against the current document, memoized by index
    /// fingerprint, question, `top_k` and `return_all`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if no document is loaded, and
    /// propagates pipeline errors. Failures are not cached.
    pub async fn answer_cached(
        &mut self,
        pipeline: &QueryPipeline,
        question: &str,
        return_all: bool,
    ) -> Result<QueryResult> {
        let index = self.current.clone().ok_or_else(|| RagError::PipelineError {
            message: "no document loaded".to_string(),
            transient: false,
        })?;

        let key = fingerprint::query_fingerprint(
            index.fingerprint(),
            question,
            pipeline.config().top_k,
            return_all,
        );
        if let Some(result) = self.answer_cache.get(&key) {
            debug!("answer served from cache");
            return Ok(result.clone());
        }

        let result = pipeline.answer_query(question, &index, return_all).await?;
        self.answer_cache.insert(key, result.clone());
        Ok(result)
    }

    /// Ask a question as part of the conversation.
    ///
    /// The question and the answer are appended to [`messages`](Self::messages).
    /// If answering fails the question is removed again, so the conversation
    /// never ends with an unanswered user message.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] for a blank question, and
    /// propagates the errors of [`answer_cached`](Self::answer_cached).
    pub async fn ask(&mut self, pipeline: &QueryPipeline, question: &str) -> Result<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::PipelineError {
                message: "question must not be empty".to_string(),
                transient: false,
            });
        }

        self.messages.push(ChatMessage::user(question));
        match self.answer_cached(pipeline, question, false).await {
            Ok(result) => {
                self.messages.push(ChatMessage::assistant(result.answer.clone()));
                Ok(result)
            }
            Err(e) => {
                self.messages.pop();
                Err(e)
            }
        }
    }

    /// Run a predefined question against the current document, memoized.
    pub async fn canned(
        &mut self,
        pipeline: &QueryPipeline,
        query: CannedQuery,
    ) -> Result<QueryResult> {
        self.answer_cached(pipeline, query.question(), false).await
    }
}
