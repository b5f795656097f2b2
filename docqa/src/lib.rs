//! # docqa
//!
//! Grounded question answering over a single uploaded document.
//!
//! Extracted pages are cut into overlapping, source-tagged [`Segment`]s,
//! embedded into a [`SegmentIndex`], and searched per question. The most
//! similar segments are rendered into a grounded prompt, the
//! [`LanguageModel`] is called once, and its `SOURCES: ` line is parsed back
//! into the segments it cited.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa::{
//!     DebugEmbeddingProvider, DebugLanguageModel, Document, FixedSizeChunker, Page,
//!     QueryPipeline, RagConfig, SegmentIndex,
//! };
//!
//! let chunker = FixedSizeChunker::new(300, 0)?;
//! let document = Document::from_pages("tender.pdf", &pages, &chunker)?;
//! let embedder = Arc::new(DebugEmbeddingProvider::default());
//! let index = SegmentIndex::build(vec![document], embedder).await?;
//!
//! let pipeline = QueryPipeline::builder()
//!     .config(RagConfig::default())
//!     .language_model(Arc::new(DebugLanguageModel))
//!     .build()?;
//! let result = pipeline.answer_query("Who is the buyer?", &index, false).await?;
//! ```
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIEmbeddingProvider`] and [`openai::OpenAIChatModel`]

pub mod backend;
pub mod cache;
pub mod chunking;
pub mod citation;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod inmemory;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

pub use cache::{AnswerCache, IndexCache};
pub use chunking::{Chunker, FixedSizeChunker};
pub use citation::{Extraction, Resolution, SOURCES_MARKER, extract, resolve};
pub use config::{Backend, ProviderSettings, RagConfig, RagConfigBuilder};
pub use document::{Document, Page, QueryResult, SearchResult, Segment};
pub use embedding::{DebugEmbeddingProvider, EmbeddingProvider};
pub use error::{RagError, Result};
pub use index::SegmentIndex;
pub use inmemory::InMemoryVectorStore;
pub use llm::{DebugLanguageModel, LanguageModel, ScriptedLanguageModel};
pub use pipeline::{CannedQuery, DefaultAnswers, QueryPipeline, QueryPipelineBuilder};
pub use prompt::PromptBuilder;
pub use session::{ChatMessage, ChatSession, GREETING, Role};
pub use vectorstore::{ScoredOrdinal, StoredVector, VectorStore};

#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
