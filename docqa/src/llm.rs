//! Language model trait for answer generation.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{RagError, Result};
use crate::prompt;

/// A language model that completes a prompt in a single call.
///
/// Implementations wrap a specific backend (OpenAI, a local model, a test
/// double). The pipeline calls [`generate`](LanguageModel::generate) exactly
/// once per question and never retries; a failure should say whether it is
/// transient through [`RagError::ModelError`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name used in logs and errors.
    fn name(&self) -> &str;
}

/// Offline model for the debug backend.
///
/// Answers with a fixed sentence and cites the first segment shown in the
/// excerpt block of a [`PromptBuilder`](crate::PromptBuilder) prompt, so the
/// whole answer path (extraction and resolution included) runs without a
/// network call. Prompts of any other shape get an empty citation list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugLanguageModel;

impl DebugLanguageModel {
    fn first_source(prompt: &str) -> Option<&str> {
        prompt::excerpt_section(prompt)?
            .lines()
            .find_map(|line| line.strip_prefix("Source: "))
            .map(str::trim)
    }
}

#[async_trait]
impl LanguageModel for DebugLanguageModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let sources = Self::first_source(prompt).unwrap_or_default();
        Ok(format!("This is a debug answer.\nSOURCES: {sources}"))
    }

    fn name(&self) -> &str {
        "debug"
    }
}

/// Test double that returns queued replies and records every prompt.
///
/// Replies are handed out in order; once only one remains it is repeated for
/// every further call. An empty script fails with a permanent model error.
#[derive(Debug, Default)]
pub struct ScriptedLanguageModel {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLanguageModel {
    /// Create a model that replies with `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a model whose every call fails with `error`.
    pub fn failing(message: impl Into<String>, transient: bool) -> Self {
        let error =
            RagError::ModelError { model: "scripted".into(), message: message.into(), transient };
        Self { replies: Mutex::new(VecDeque::from([Err(error)])), prompts: Mutex::new(Vec::new()) }
    }

    /// Prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

fn clone_reply(reply: &Result<String>) -> Result<String> {
    match reply {
        Ok(text) => Ok(text.clone()),
        Err(RagError::ModelError { model, message, transient }) => Err(RagError::ModelError {
            model: model.clone(),
            message: message.clone(),
            transient: *transient,
        }),
        Err(other) => Err(RagError::ModelError {
            model: "scripted".into(),
            message: other.to_string(),
            transient: other.is_transient(),
        }),
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());

        let mut replies = self.replies.lock().await;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().map(clone_reply)
        };
        debug!(model = "scripted", remaining = replies.len(), "scripted reply");

        reply.unwrap_or_else(|| {
            Err(RagError::ModelError {
                model: "scripted".into(),
                message: "no scripted replies configured".into(),
                transient: false,
            })
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Segment;
    use crate::prompt::PromptBuilder;

    #[tokio::test]
    async fn scripted_replies_in_order_then_repeat_last() {
        let model = ScriptedLanguageModel::new(["first", "second"]);
        assert_eq!(model.generate("a").await.unwrap(), "first");
        assert_eq!(model.generate("b").await.unwrap(), "second");
        assert_eq!(model.generate("c").await.unwrap(), "second");
        assert_eq!(model.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failing_model_reports_transience() {
        let model = ScriptedLanguageModel::failing("rate limited", true);
        let err = model.generate("a").await.unwrap_err();
        assert!(err.is_transient());
        assert!(model.generate("b").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn empty_script_is_a_permanent_error() {
        let model = ScriptedLanguageModel::default();
        assert!(!model.generate("a").await.unwrap_err().is_transient());
    }

    fn segment(source_id: &str, text: &str) -> Segment {
        Segment {
            source_id: source_id.to_string(),
            text: text.to_string(),
            document_id: "doc".to_string(),
            page: 2,
            index: 0,
        }
    }

    #[tokio::test]
    async fn debug_model_cites_first_excerpt() {
        let segments = [segment("2-0", "alpha"), segment("3-1", "Next QUESTION: beta")];
        for builder in [PromptBuilder::new(), PromptBuilder::without_example()] {
            let prompt = builder.build_prompt(&segments, "real");
            let reply = DebugLanguageModel.generate(&prompt).await.unwrap();
            assert_eq!(reply, "This is a debug answer.\nSOURCES: 2-0");
        }
    }

    #[tokio::test]
    async fn debug_model_cites_nothing_for_foreign_prompts() {
        let reply = DebugLanguageModel.generate("QUESTION: x\nSource: 9-9\n").await.unwrap();
        assert!(reply.ends_with("SOURCES: "));
    }
}
