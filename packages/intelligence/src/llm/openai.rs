//! OpenAI-compatible chat completion client.
//!
//! One client per provider account; DashScope and OpenRouter both speak
//! this protocol, so provider identity is just a base URL and a key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::security::SecretString;
use crate::traits::llm::ChatModel;

/// Alibaba DashScope's OpenAI-compatible endpoint.
pub const DASHSCOPE_BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";

/// OpenRouter's endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
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

/// Chat client for any OpenAI-compatible provider.
pub struct OpenAiChatModel {
    provider: String,
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    /// Create a client for a named provider at a base URL.
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<SecretString>,
    ) -> Self {
        Self {
            provider: provider.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Alibaba DashScope convenience constructor.
    pub fn alibaba(api_key: impl Into<SecretString>) -> Self {
        Self::new("alibaba", DASHSCOPE_BASE_URL, api_key)
    }

    /// OpenRouter convenience constructor.
    pub fn openrouter(api_key: impl Into<SecretString>) -> Self {
        Self::new("openrouter", OPENROUTER_BASE_URL, api_key)
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn complete_json(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        debug!(provider = %self.provider, model, "chat completion starting");

        let request = Request {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(Box::new(e))
                }
            })?;

        let status = response.status().as_u16();
        match status {
            401 | 403 => return Err(LlmError::Auth { status }),
            402 => return Err(LlmError::Quota),
            429 => return Err(LlmError::RateLimited),
            s if !(200..300).contains(&s) => {
                let message = response.text().await.unwrap_or_default();
                return Err(LlmError::Api { status, message });
            }
            _ => {}
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| LlmError::Http(Box::new(e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::NoContent)
    }
}
