//! Error types for the `docqa` crate.

use thiserror::Error;

/// Errors that can occur while segmenting, indexing or answering.
///
/// Provider and model failures carry a `transient` flag. Transient failures
/// (rate limits, timeouts, network trouble) may succeed when the caller
/// re-submits the whole operation; the crate itself never retries.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking, retrieval or backend configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
        /// Whether retrying the operation may succeed.
        transient: bool,
    },

    /// The language model call failed.
    #[error("Model error ({model}): {message}")]
    ModelError {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
        /// Whether retrying the operation may succeed.
        transient: bool,
    },

    /// The extracted pages cannot form a document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in index construction or query orchestration.
    #[error("Pipeline error: {message}")]
    PipelineError {
        /// A description of the failure, including the underlying cause.
        message: String,
        /// Whether the underlying cause is transient.
        transient: bool,
    },
}

impl RagError {
    /// Whether the caller may retry the failed operation.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::EmbeddingError { transient, .. }
            | Self::ModelError { transient, .. }
            | Self::PipelineError { transient, .. } => *transient,
            Self::ConfigError(_) | Self::InvalidDocument(_) | Self::VectorStoreError { .. } => {
                false
            }
        }
    }

    /// Wrap this error as a [`RagError::PipelineError`], keeping its transient flag.
    pub(crate) fn into_pipeline(self, context: impl std::fmt::Display) -> Self {
        let transient = self.is_transient();
        Self::PipelineError { message: format!("{context}: {self}"), transient }
    }
}

/// Classify an HTTP status code returned by a remote provider.
///
/// Timeouts, rate limits and server errors are transient; anything else
/// (bad credentials, malformed input) is permanent.
pub fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// A convenience result type for document QA operations.
pub type Result<T> = std::result::Result<T, RagError>;
