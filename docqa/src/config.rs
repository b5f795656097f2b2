//! Configuration for segmentation, retrieval and backend selection.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default chat model used for answer generation.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Which embedding and language model implementations to wire up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// OpenAI embeddings and chat completions (requires the `openai` feature).
    #[default]
    OpenAI,
    /// Deterministic offline embeddings and a scripted model.
    Debug,
}

/// Configuration parameters for the question-answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum segment length in characters.
    pub chunk_size: usize,
    /// Number of characters shared between consecutive segments of a page.
    pub chunk_overlap: usize,
    /// Number of segments retrieved per question.
    pub top_k: usize,
    /// Embedding and model backend.
    pub backend: Backend,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 300, chunk_overlap: 0, top_k: 5, backend: Backend::OpenAI }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        validate_top_k(self.top_k)
    }
}

/// Validate the number of segments retrieved per question.
pub(crate) fn validate_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
    }
    Ok(())
}

/// Validate a `(chunk_size, chunk_overlap)` pair.
pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ConfigError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum segment length in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive segments in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of segments retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Select the embedding and model backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Credentials and model names for the remote backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// API key, if one was found.
    pub api_key: Option<String>,
    /// Chat model used for answer generation.
    pub chat_model: String,
    /// Embedding model used for both indexing and queries.
    pub embedding_model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ProviderSettings {
    /// Read settings from the environment, loading a `.env` file first if present.
    ///
    /// Reads `OPENAI_API_KEY`, `DOCQA_CHAT_MODEL` and `DOCQA_EMBEDDING_MODEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            chat_model: lookup("DOCQA_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: lookup("DOCQA_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
        }
    }

    /// Return the API key required by `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the OpenAI backend is selected and
    /// no key is configured. The debug backend never needs one.
    pub fn require_key(&self, backend: Backend) -> Result<Option<&str>> {
        match backend {
            Backend::Debug => Ok(None),
            Backend::OpenAI => self.api_key.as_deref().map(Some).ok_or_else(|| {
                RagError::ConfigError("OPENAI_API_KEY is not set".to_string())
            }),
        }
    }
}
