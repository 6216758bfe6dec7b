//! reqwest-backed page fetcher.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};

/// Default User-Agent. News sites serve stripped or blocked pages to
/// obvious bots, so this mimics a desktop browser.
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP fetcher for article pages.
///
/// Treats 401, 403 and 429 as soft blocks (`FetchError::Blocked`) so the
/// acquisition chain can fall through to search instead of aborting.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new fetcher with a 10 second timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: DESKTOP_UA.to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        debug!(url = %url, "page fetch starting");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return FetchError::Timeout {
                        url: url.to_string(),
                    };
                }
                warn!(url = %url, error = %e, "page fetch failed");
                FetchError::Http(Box::new(e))
            })?;

        let status = response.status().as_u16();
        if matches!(status, 401 | 403 | 429) {
            debug!(url = %url, status, "page fetch soft-blocked");
            return Err(FetchError::Blocked {
                url: url.to_string(),
                status,
            });
        }
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(FetchedPage::new(final_url, html))
    }
}
