//! Chat model trait for structured extraction.

use async_trait::async_trait;

use crate::error::LlmError;

/// A chat completion backend that returns JSON text.
///
/// One implementation per provider account; the model is chosen per call so
/// the orchestrator can walk a provider's model list without rebuilding
/// clients.
///
/// # Implementations
///
/// - `OpenAiChatModel` - any OpenAI-compatible endpoint (DashScope, OpenRouter)
/// - `MockChatModel` - for testing
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name for logging ("alibaba", "openrouter", ...).
    fn provider(&self) -> &str;

    /// Run a completion in JSON mode and return the raw response text.
    async fn complete_json(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError>;
}

/// Scripted reply for the mock model.
enum Scripted {
    Content(String),
    Auth(u16),
    RateLimited,
    NoContent,
}

/// Mock chat model for testing.
///
/// Replies are scripted per model name and consumed in order, so a test can
/// make the first model fail and the second succeed.
pub struct MockChatModel {
    provider: String,
    replies: std::sync::RwLock<std::collections::HashMap<String, std::collections::VecDeque<Scripted>>>,
    calls: std::sync::RwLock<Vec<String>>,
}

impl MockChatModel {
    /// Create a new mock model for a named provider.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            replies: std::sync::RwLock::new(std::collections::HashMap::new()),
            calls: std::sync::RwLock::new(Vec::new()),
        }
    }

    fn push(self, model: &str, reply: Scripted) -> Self {
        self.replies
            .write()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Script a successful completion for a model.
    pub fn with_reply(self, model: &str, content: &str) -> Self {
        self.push(model, Scripted::Content(content.to_string()))
    }

    /// Script an auth failure (provider-level escalation) for a model.
    pub fn with_auth_failure(self, model: &str, status: u16) -> Self {
        self.push(model, Scripted::Auth(status))
    }

    /// Script a rate-limit failure for a model.
    pub fn with_rate_limit(self, model: &str) -> Self {
        self.push(model, Scripted::RateLimited)
    }

    /// Script an empty completion for a model.
    pub fn with_empty(self, model: &str) -> Self {
        self.push(model, Scripted::NoContent)
    }

    /// Model names called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn complete_json(
        &self,
        model: &str,
        _system: &str,
        _user: &str,
    ) -> Result<String, LlmError> {
        self.calls.write().unwrap().push(model.to_string());

        let reply = self
            .replies
            .write()
            .unwrap()
            .get_mut(model)
            .and_then(|q| q.pop_front());

        match reply {
            Some(Scripted::Content(text)) => Ok(text),
            Some(Scripted::Auth(status)) => Err(LlmError::Auth { status }),
            Some(Scripted::RateLimited) => Err(LlmError::RateLimited),
            Some(Scripted::NoContent) | None => Err(LlmError::NoContent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_consumed_in_order() {
        let model = MockChatModel::new("mock")
            .with_rate_limit("m1")
            .with_reply("m1", "{\"ok\":true}");

        assert!(matches!(
            model.complete_json("m1", "s", "u").await,
            Err(LlmError::RateLimited)
        ));
        assert_eq!(
            model.complete_json("m1", "s", "u").await.unwrap(),
            "{\"ok\":true}"
        );
        assert_eq!(model.calls(), vec!["m1", "m1"]);
    }

    #[tokio::test]
    async fn test_unscripted_model_is_empty() {
        let model = MockChatModel::new("mock");
        assert!(matches!(
            model.complete_json("mystery", "s", "u").await,
            Err(LlmError::NoContent)
        ));
    }
}
