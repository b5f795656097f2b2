//! Backend selection from configuration.
//!
//! Call sites ask for "the embedding provider" or "the language model" and
//! get whichever implementation [`RagConfig::backend`] names.

use std::sync::Arc;

use tracing::info;

use crate::config::{Backend, ProviderSettings, RagConfig};
use crate::embedding::{DebugEmbeddingProvider, EmbeddingProvider};
use crate::error::Result;
use crate::llm::{DebugLanguageModel, LanguageModel};

/// Build the embedding provider selected by `config`.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if the
/// OpenAI backend is selected without an API key, or the crate was built
/// without the `openai` feature.
pub fn embedding_provider(
    config: &RagConfig,
    settings: &ProviderSettings,
) -> Result<Arc<dyn EmbeddingProvider>> {
    let key = settings.require_key(config.backend)?;
    info!(backend = ?config.backend, "selecting embedding provider");
    match (config.backend, key) {
        (Backend::OpenAI, Some(key)) => openai_embeddings(key, settings),
        _ => Ok(Arc::new(DebugEmbeddingProvider::default())),
    }
}

/// Build the language model selected by `config`.
///
/// # Errors
///
/// Same conditions as [`embedding_provider`].
pub fn language_model(
    config: &RagConfig,
    settings: &ProviderSettings,
) -> Result<Arc<dyn LanguageModel>> {
    let key = settings.require_key(config.backend)?;
    info!(backend = ?config.backend, "selecting language model");
    match (config.backend, key) {
        (Backend::OpenAI, Some(key)) => openai_chat(key, settings),
        _ => Ok(Arc::new(DebugLanguageModel)),
    }
}

#[cfg(feature = "openai")]
fn openai_embeddings(key: &str, settings: &ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = crate::openai::OpenAIEmbeddingProvider::new(key)?
        .with_model(settings.embedding_model.clone());
    Ok(Arc::new(provider))
}

#[cfg(feature = "openai")]
fn openai_chat(key: &str, settings: &ProviderSettings) -> Result<Arc<dyn LanguageModel>> {
    let model = crate::openai::OpenAIChatModel::new(key)?.with_model(settings.chat_model.clone());
    Ok(Arc::new(model))
}

#[cfg(not(feature = "openai"))]
fn openai_embeddings(
    _key: &str,
    _settings: &ProviderSettings,
) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(crate::RagError::ConfigError(
        "the OpenAI backend requires the `openai` feature".to_string(),
    ))
}

#[cfg(not(feature = "openai"))]
fn openai_chat(_key: &str, _settings: &ProviderSettings) -> Result<Arc<dyn LanguageModel>> {
    Err(crate::RagError::ConfigError(
        "the OpenAI backend requires the `openai` feature".to_string(),
    ))
}
