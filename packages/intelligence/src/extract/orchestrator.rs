//! Provider/model failover for extraction.
//!
//! Providers are tried in plan order; within a provider, models in list
//! order. Most failures are model-level and move to the next model, but an
//! auth failure disqualifies the whole provider, since every model behind
//! the same key will fail the same way.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{IntelError, LlmError, Result};
use crate::extract::parse::{declares_no_signal, parse_analysis};
use crate::extract::prompts::{system_prompt, user_prompt};
use crate::traits::llm::ChatModel;
use crate::types::analysis::AnalysisResult;
use crate::types::item::ContentItem;

/// One provider with its ordered model list.
pub struct ProviderPlan {
    /// The provider client
    pub chat: Arc<dyn ChatModel>,

    /// Models to try, best first
    pub models: Vec<String>,
}

impl ProviderPlan {
    /// Create a plan from a client and model names.
    pub fn new(chat: Arc<dyn ChatModel>, models: &[&str]) -> Self {
        Self {
            chat,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// What extraction concluded about one story.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The story carries signal; here is the analysis
    Analyzed(AnalysisResult),

    /// A model answered, and the answer is "nothing here"
    NoSignal,

    /// Input below the minimum worth spending tokens on
    InputTooShort,
}

/// Walks the provider/model plan until one completion parses.
pub struct ExtractionOrchestrator {
    plans: Vec<ProviderPlan>,
    min_input_chars: usize,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator over an ordered set of provider plans.
    pub fn new(plans: Vec<ProviderPlan>) -> Self {
        Self {
            plans,
            min_input_chars: 100,
        }
    }

    /// Override the minimum input length.
    pub fn with_min_input_chars(mut self, chars: usize) -> Self {
        self.min_input_chars = chars;
        self
    }

    /// Extract an analysis for one story.
    ///
    /// Errors only when every model on every usable provider failed; a
    /// model deciding the story has no signal is a normal outcome.
    pub async fn extract(&self, item: &ContentItem, text: &str) -> Result<ExtractionOutcome> {
        if text.len() < self.min_input_chars {
            debug!(url = %item.url, chars = text.len(), "input too short for extraction");
            return Ok(ExtractionOutcome::InputTooShort);
        }
        if self.plans.is_empty() {
            return Err(IntelError::Config("no extraction providers configured".into()));
        }

        let system = system_prompt(item.niche_hint());
        let user = user_prompt(&item.title, text);
        let mut last_error: Option<LlmError> = None;

        for plan in &self.plans {
            let provider = plan.chat.provider().to_string();

            for model in &plan.models {
                match plan.chat.complete_json(model, &system, &user).await {
                    Ok(raw) => match parse_analysis(&raw) {
                        // Only the explicit null protocol reply is a verdict;
                        // an object merely missing the mandatory fields is an
                        // incomplete answer and the next model gets a turn.
                        Ok(analysis) if analysis.is_empty() => {
                            if declares_no_signal(&raw) {
                                debug!(url = %item.url, %provider, model, "model reports no signal");
                                return Ok(ExtractionOutcome::NoSignal);
                            }
                            warn!(url = %item.url, %provider, model, "mandatory fields missing, trying next model");
                        }
                        Ok(analysis) => {
                            debug!(url = %item.url, %provider, model, "extraction succeeded");
                            return Ok(ExtractionOutcome::Analyzed(analysis));
                        }
                        Err(e) => {
                            warn!(url = %item.url, %provider, model, error = %e, "unparseable completion, trying next model");
                        }
                    },
                    Err(e) if e.is_provider_level() => {
                        warn!(%provider, error = %e, "provider disqualified, skipping its remaining models");
                        last_error = Some(e);
                        break;
                    }
                    Err(e) => {
                        warn!(%provider, model, error = %e, "model failed, trying next");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(IntelError::Llm(last_error.unwrap_or(LlmError::NoContent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::llm::MockChatModel;

    const ANALYSIS: &str = r#"{"sentiment": "Moderate Urgency", "category": "budget"}"#;

    fn item() -> ContentItem {
        ContentItem::new("Mayor unveils budget", "https://e.com/budget")
    }

    fn text() -> String {
        "x".repeat(500)
    }

    #[tokio::test]
    async fn test_first_model_wins() {
        let chat = Arc::new(MockChatModel::new("p1").with_reply("m1", ANALYSIS));
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1", "m2"])]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Analyzed(_)));
        assert_eq!(chat.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_model_failover_within_provider() {
        let chat = Arc::new(
            MockChatModel::new("p1")
                .with_rate_limit("m1")
                .with_reply("m2", ANALYSIS),
        );
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1", "m2"])]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Analyzed(_)));
        assert_eq!(chat.calls(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_auth_failure_skips_provider() {
        let p1 = Arc::new(MockChatModel::new("p1").with_auth_failure("m1", 401));
        let p2 = Arc::new(MockChatModel::new("p2").with_reply("m3", ANALYSIS));
        let orch = ExtractionOrchestrator::new(vec![
            ProviderPlan::new(p1.clone(), &["m1", "m2"]),
            ProviderPlan::new(p2.clone(), &["m3"]),
        ]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Analyzed(_)));
        // m2 never attempted after the provider-level auth failure.
        assert_eq!(p1.calls(), vec!["m1"]);
        assert_eq!(p2.calls(), vec!["m3"]);
    }

    #[tokio::test]
    async fn test_unparseable_reply_moves_to_next_model() {
        let chat = Arc::new(
            MockChatModel::new("p1")
                .with_reply("m1", "I cannot produce JSON today.")
                .with_reply("m2", ANALYSIS),
        );
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1", "m2"])]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Analyzed(_)));
    }

    #[tokio::test]
    async fn test_no_signal_short_circuits() {
        let chat = Arc::new(
            MockChatModel::new("p1").with_reply("m1", r#"{"sentiment": null, "category": null}"#),
        );
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1", "m2"])]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert_eq!(outcome, ExtractionOutcome::NoSignal);
        assert_eq!(chat.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_incomplete_object_falls_through_to_next_model() {
        let chat = Arc::new(
            MockChatModel::new("p1")
                .with_reply("m1", "{}")
                .with_reply("m2", ANALYSIS),
        );
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1", "m2"])]);

        let outcome = orch.extract(&item(), &text()).await.unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Analyzed(_)));
        assert_eq!(chat.calls(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_short_input_skipped() {
        let chat = Arc::new(MockChatModel::new("p1"));
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat.clone(), &["m1"])]);

        let outcome = orch.extract(&item(), "tiny").await.unwrap();
        assert_eq!(outcome, ExtractionOutcome::InputTooShort);
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_models_failing_is_an_error() {
        let chat = Arc::new(MockChatModel::new("p1").with_rate_limit("m1").with_rate_limit("m2"));
        let orch = ExtractionOrchestrator::new(vec![ProviderPlan::new(chat, &["m1", "m2"])]);

        assert!(orch.extract(&item(), &text()).await.is_err());
    }
}
