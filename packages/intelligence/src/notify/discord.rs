//! Discord webhook alerter.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::{IntelError, Result};
use crate::security::SecretString;
use crate::traits::notifier::Alerter;

/// Sends alerts to a Discord webhook.
pub struct DiscordAlerter {
    webhook_url: SecretString,
    client: reqwest::Client,
}

impl DiscordAlerter {
    /// Create an alerter for a webhook URL. The URL embeds the token, so it
    /// is held as a secret.
    pub fn new(webhook_url: impl Into<SecretString>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl Alerter for DiscordAlerter {
    async fn alert(&self, title: &str, body: &str) -> Result<()> {
        debug!(title, "sending discord alert");

        let payload = json!({
            "embeds": [{
                "title": title,
                "description": body,
                "color": 15158332,
            }]
        });

        let response = self
            .client
            .post(self.webhook_url.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| IntelError::Notify(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IntelError::Notify(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
