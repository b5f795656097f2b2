//! Question-answering orchestrator.
//!
//! The [`QueryPipeline`] ties retrieval, prompting, generation and citation
//! handling together: search the index, render the grounded prompt, call
//! the model once, then split and resolve its citations.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa::{QueryPipeline, RagConfig, SegmentIndex};
//!
//! let pipeline = QueryPipeline::builder()
//!     .config(RagConfig::default())
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! let index = SegmentIndex::build(vec![document], Arc::new(embedder)).await?;
//! let result = pipeline.answer_query("Who is the buyer?", &index, false).await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::citation;
use crate::config::{RagConfig, validate_top_k};
use crate::document::{QueryResult, Segment};
use crate::error::{RagError, Result};
use crate::index::SegmentIndex;
use crate::llm::LanguageModel;
use crate::prompt::PromptBuilder;

/// Predefined questions asked of every uploaded document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CannedQuery {
    /// What the document is about.
    Overview,
    /// Every requirement stated or implied by a tender document.
    Requirements,
    /// Who the buyer is and what is known about them.
    BuyerProfile,
    /// A short summary of the main topic and purpose.
    Summary,
}

impl CannedQuery {
    /// The question text sent through the normal query path.
    pub fn question(self) -> &'static str {
        match self {
            Self::Overview => {
                "What is this document about? Provide a clear and concise summary of its main \
                 topic and purpose."
            }
            Self::Requirements => {
                "You are a legal expert analyzing an RFP document. Your task is to: \
                 - Extract **all** requirements, including those that are implied or stated \
                 indirectly. \
                 - Organize the requirements by their respective topics as structured in the \
                 document. \
                 - Present the information in clear, concise bullet points. \
                 - Ensure that no requirement is overlooked. \
                 - If any statements are ambiguous but may contain requirements, please include \
                 them and mark them as 'Potential Requirement - Needs Clarification.'"
            }
            Self::BuyerProfile => {
                "Who is the buyer? What company information can you find of the buyer? Focus on \
                 the company's background, capabilities, and relevant experience."
            }
            Self::Summary => {
                "Provide a clear and concise summary of the document's main topic and purpose."
            }
        }
    }
}

/// Answers prepared for the overview screen right after an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultAnswers {
    /// Answer to [`CannedQuery::Requirements`].
    pub requirements: QueryResult,
    /// Answer to [`CannedQuery::BuyerProfile`].
    pub buyer: QueryResult,
    /// Answer to [`CannedQuery::Summary`].
    pub summary: QueryResult,
}

/// The question-answering orchestrator.
///
/// Holds no per-document state: the index is passed to every call and is
/// only read. Construct one via [`QueryPipeline::builder()`].
pub struct QueryPipeline {
    config: RagConfig,
    language_model: Arc<dyn LanguageModel>,
    prompt_builder: PromptBuilder,
}

impl QueryPipeline {
    /// Create a new [`QueryPipelineBuilder`].
    pub fn builder() -> QueryPipelineBuilder {
        QueryPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the language model.
    pub fn language_model(&self) -> &Arc<dyn LanguageModel> {
        &self.language_model
    }

    /// Answer `question` using the configured `top_k`.
    ///
    /// # Errors
    ///
    /// See [`QueryPipeline::answer_query_with_k`].
    pub async fn answer_query(
        &self,
        question: &str,
        index: &SegmentIndex,
        return_all: bool,
    ) -> Result<QueryResult> {
        self.answer_query_with_k(question, index, self.config.top_k, return_all).await
    }

    /// Answer `question` from the `k` segments most similar to it.
    ///
    /// With `return_all` the sources are exactly the retrieved segments, in
    /// retrieval order, whatever the model cited. Otherwise the sources are
    /// the cited segments that exist in the index; cited identifiers that
    /// match nothing are dropped from the sources and listed in
    /// [`QueryResult::unresolved_citations`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if retrieval or the model call
    /// fails. The error keeps the transient flag of its cause so the caller
    /// can decide whether to offer a retry.
    pub async fn answer_query_with_k(
        &self,
        question: &str,
        index: &SegmentIndex,
        k: usize,
        return_all: bool,
    ) -> Result<QueryResult> {
        // 1. Retrieve
        let retrieved: Vec<Segment> =
            index.search(question, k).await?.into_iter().map(|r| r.segment).collect();
        let retrieved_count = retrieved.len();

        // 2. Prompt
        let prompt = self.prompt_builder.build_prompt(&retrieved, question);

        // 3. Generate
        let raw = self.language_model.generate(&prompt).await.map_err(|e| {
            error!(model = self.language_model.name(), error = %e, "model invocation failed");
            e.into_pipeline("model invocation failed")
        })?;

        // 4. Extract and resolve
        let extraction = citation::extract(&raw);
        let (sources, unresolved_citations) = if return_all {
            (retrieved, Vec::new())
        } else {
            let resolution = citation::resolve(&extraction.cited_source_ids, index.documents());
            if !resolution.unresolved.is_empty() {
                warn!(
                    unresolved = ?resolution.unresolved,
                    "model cited sources that do not exist in the index"
                );
            }
            (resolution.segments, resolution.unresolved)
        };

        info!(
            retrieved = retrieved_count,
            cited = extraction.cited_source_ids.len(),
            source_count = sources.len(),
            return_all,
            "query answered"
        );

        Ok(QueryResult { answer: extraction.answer, sources, unresolved_citations })
    }

    /// Ask one of the predefined questions.
    pub async fn run_canned(
        &self,
        query: CannedQuery,
        index: &SegmentIndex,
    ) -> Result<QueryResult> {
        self.answer_query(query.question(), index, false).await
    }

    /// Ask what the document is about.
    pub async fn document_overview(&self, index: &SegmentIndex) -> Result<QueryResult> {
        self.run_canned(CannedQuery::Overview, index).await
    }

    /// Prepare the requirements, buyer and summary answers for a new upload.
    ///
    /// The three questions are asked one after another; the first failure
    /// aborts the rest.
    pub async fn default_answers(&self, index: &SegmentIndex) -> Result<DefaultAnswers> {
        Ok(DefaultAnswers {
            requirements: self.run_canned(CannedQuery::Requirements, index).await?,
            buyer: self.run_canned(CannedQuery::BuyerProfile, index).await?,
            summary: self.run_canned(CannedQuery::Summary, index).await?,
        })
    }
}

/// Builder for constructing a [`QueryPipeline`].
///
/// The language model is required; the configuration defaults to
/// [`RagConfig::default()`] and the prompt builder to [`PromptBuilder::new()`].
#[derive(Default)]
pub struct QueryPipelineBuilder {
    config: Option<RagConfig>,
    language_model: Option<Arc<dyn LanguageModel>>,
    prompt_builder: Option<PromptBuilder>,
}

impl QueryPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Override the prompt builder.
    pub fn prompt_builder(mut self, builder: PromptBuilder) -> Self {
        self.prompt_builder = Some(builder);
        self
    }

    /// Build the [`QueryPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the language model is missing or
    /// `top_k` is zero. Chunking parameters are not checked here; they are
    /// used by [`FixedSizeChunker::from_config`](crate::FixedSizeChunker::from_config).
    pub fn build(self) -> Result<QueryPipeline> {
        let config = self.config.unwrap_or_default();
        validate_top_k(config.top_k)?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::ConfigError("language_model is required".to_string()))?;

        Ok(QueryPipeline {
            config,
            language_model,
            prompt_builder: self.prompt_builder.unwrap_or_default(),
        })
    }
}
