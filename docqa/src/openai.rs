//! OpenAI-backed embeddings and chat completions.
//!
//! Requires the `openai` feature. Both types talk to the same REST API and
//! share one connection setup; failures are classified by HTTP status so callers
//! can tell rate limits and outages apart from bad credentials.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, is_transient_status};
use crate::llm::LanguageModel;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Output size of the known embedding models.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// A failed exchange with the API.
struct Failure {
    message: String,
    transient: bool,
}

/// Base URL, credentials and HTTP client for one API account.
#[derive(Clone)]
struct Endpoint {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Endpoint {
    fn new(api_key: String, component: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError(format!("{component}: API key must not be empty")));
        }
        Ok(Self { http: reqwest::Client::new(), base_url: OPENAI_BASE_URL.to_string(), api_key })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, Failure>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let response =
            self.http.post(&url).bearer_auth(&self.api_key).json(body).send().await.map_err(
                |e| Failure { message: format!("request to {url} failed: {e}"), transient: true },
            )?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Failure {
                message: format!("{path} returned {status}: {reason}"),
                transient: is_transient_status(status.as_u16()),
            });
        }

        response.json::<R>().await.map_err(|e| Failure {
            message: format!("unreadable {path} response: {e}"),
            transient: false,
        })
    }
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

// Embeddings

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Embeds segments and questions with the OpenAI embeddings API.
///
/// Uses `text-embedding-3-small` unless another model is set with
/// [`with_model`](Self::with_model). The same instance must embed both the
/// indexed segments and the questions asked against them.
///
/// ```rust,ignore
/// let embedder = OpenAIEmbeddingProvider::new(api_key)?;
/// let index = SegmentIndex::build(documents, Arc::new(embedder)).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    endpoint: Endpoint,
    model: String,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for a blank key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(api_key.into(), "OpenAI embeddings")?,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    /// Use another embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to an OpenAI-compatible server instead.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text]).await?.pop().ok_or_else(|| RagError::EmbeddingError {
            provider: self.name().to_string(),
            message: "no embedding returned".to_string(),
            transient: false,
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch_size = texts.len(), "requesting embeddings");

        let body = EmbeddingsBody { model: &self.model, input: texts };
        let reply: EmbeddingsReply = self.endpoint.post("embeddings", &body).await.map_err(|f| {
            error!(
                model = %self.model,
                transient = f.transient,
                error = %f.message,
                "embeddings failed"
            );
            RagError::EmbeddingError {
                provider: self.name().to_string(),
                message: f.message,
                transient: f.transient,
            }
        })?;

        let mut items = reply.data;
        items.sort_by_key(|item| item.index);
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        model_dimensions(&self.model)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

// Chat completions

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Generates answers with the OpenAI chat completions API.
///
/// The whole prompt goes out as one user message at temperature 0, and the
/// first choice is returned verbatim.
pub struct OpenAIChatModel {
    endpoint: Endpoint,
    model: String,
}

impl OpenAIChatModel {
    /// Create a `gpt-4` model authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for a blank key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(api_key.into(), "OpenAI chat")?,
            model: DEFAULT_CHAT_MODEL.to_string(),
        })
    }

    /// Use another chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send requests to an OpenAI-compatible server instead.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint.base_url = base_url.into();
        self
    }

    fn model_error(&self, message: String, transient: bool) -> RagError {
        RagError::ModelError { model: self.model.clone(), message, transient }
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let body = CompletionBody {
            model: &self.model,
            temperature: 0.0,
            messages: [UserMessage { role: "user", content: prompt }],
        };
        let reply: CompletionReply =
            self.endpoint.post("chat/completions", &body).await.map_err(|f| {
                error!(
                    model = %self.model,
                    transient = f.transient,
                    error = %f.message,
                    "completion failed"
                );
                self.model_error(f.message, f.transient)
            })?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| self.model_error("completion had no content".to_string(), false))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
