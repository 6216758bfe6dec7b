//! Page fetcher trait for direct article retrieval.

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};

/// A fetched page: final URL after redirects plus the raw HTML body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the response actually came from
    pub url: String,

    /// Raw HTML body
    pub html: String,
}

impl FetchedPage {
    /// Create a new fetched page.
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Fetches pages over HTTP.
///
/// Implementations distinguish soft blocks (401/403/429 from anti-bot
/// walls) from hard failures via `FetchError::Blocked`, because the
/// acquisition chain treats the first as "try search instead" and only
/// logs the second.
///
/// # Implementations
///
/// - `HttpFetcher` - reqwest-backed fetcher with a desktop User-Agent
/// - `RateLimitedFetcher` - wraps another fetcher with a token bucket
/// - `MockFetcher` - for testing
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page by URL.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}

/// Mock fetcher for testing.
#[derive(Default)]
pub struct MockFetcher {
    pages: std::sync::RwLock<std::collections::HashMap<String, String>>,
    blocked: std::sync::RwLock<std::collections::HashMap<String, u16>>,
    calls: std::sync::RwLock<Vec<String>>,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this HTML for a URL.
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Return a soft-block status for a URL.
    pub fn with_blocked(self, url: &str, status: u16) -> Self {
        self.blocked
            .write()
            .unwrap()
            .insert(url.to_string(), status);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(status) = self.blocked.read().unwrap().get(url) {
            return Err(FetchError::Blocked {
                url: url.to_string(),
                status: *status,
            });
        }

        match self.pages.read().unwrap().get(url) {
            Some(html) => Ok(FetchedPage::new(url, html.clone())),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_serves_pages() {
        let fetcher = MockFetcher::new().with_page("https://example.com/a", "<html>hi</html>");

        let page = fetcher.fetch("https://example.com/a").await.unwrap();
        assert_eq!(page.html, "<html>hi</html>");
        assert_eq!(fetcher.calls(), vec!["https://example.com/a"]);
    }

    #[tokio::test]
    async fn test_mock_fetcher_blocked() {
        let fetcher = MockFetcher::new().with_blocked("https://paywalled.com/x", 403);

        let err = fetcher.fetch("https://paywalled.com/x").await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_mock_fetcher_missing_is_404() {
        let fetcher = MockFetcher::new();
        let err = fetcher.fetch("https://example.com/nope").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
