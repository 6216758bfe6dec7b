//! Alerter trait for urgent-story notifications.

use async_trait::async_trait;

use crate::error::Result;

/// Delivers out-of-band alerts for high-urgency stories.
///
/// Delivery is best-effort: the pipeline logs failures and keeps going, so
/// implementations should not retry aggressively.
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Send one alert with a short title and body.
    async fn alert(&self, title: &str, body: &str) -> Result<()>;
}

/// Mock alerter for testing.
#[derive(Default)]
pub struct MockAlerter {
    sent: std::sync::RwLock<Vec<(String, String)>>,
}

impl MockAlerter {
    /// Create a new mock alerter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts sent so far, as (title, body) pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Alerter for MockAlerter {
    async fn alert(&self, title: &str, body: &str) -> Result<()> {
        self.sent
            .write()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
