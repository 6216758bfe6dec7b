//! Web and image search traits for fallback content discovery.
//!
//! When a direct fetch comes up short, the acquisition chain falls back to
//! web search and mines the hit snippets for article text. These traits
//! abstract over the search provider so the chain and its tests never touch
//! a live API.

use async_trait::async_trait;

use crate::error::SearchResult;

/// Recency window for a search query.
///
/// Maps onto provider freshness parameters; `Any` sends no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    /// Last 24 hours
    Day,
    /// Last 7 days
    Week,
    /// Last 31 days
    Month,
    /// No recency constraint
    Any,
}

impl Recency {
    /// Brave-style freshness parameter, if the window is constrained.
    pub fn freshness_param(self) -> Option<&'static str> {
        match self {
            Recency::Day => Some("pd"),
            Recency::Week => Some("pw"),
            Recency::Month => Some("pm"),
            Recency::Any => None,
        }
    }
}

/// One web search hit with its snippet material.
#[derive(Debug, Clone, Default)]
pub struct SearchHit {
    /// Result URL
    pub url: String,

    /// Result title
    pub title: Option<String>,

    /// Main description snippet
    pub description: Option<String>,

    /// Additional snippets some providers attach per hit
    pub extra_snippets: Vec<String>,
}

impl SearchHit {
    /// Create a new hit from a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a description snippet.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an extra snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.extra_snippets.push(snippet.into());
        self
    }

    /// All snippet text for this hit, description first, joined with spaces.
    pub fn snippet_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(desc) = &self.description {
            parts.push(desc);
        }
        for s in &self.extra_snippets {
            parts.push(s);
        }
        parts.join(" ")
    }
}

/// One image search hit.
#[derive(Debug, Clone)]
pub struct ImageHit {
    /// Direct image URL
    pub url: String,

    /// Title of the hosting page, if available
    pub title: Option<String>,
}

/// Web search trait for snippet-based content recovery.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web, constrained to a recency window.
    async fn search(
        &self,
        query: &str,
        recency: Recency,
        count: usize,
    ) -> SearchResult<Vec<SearchHit>>;
}

/// Image search trait for illustrating stories with no usable image.
#[async_trait]
pub trait ImageSearcher: Send + Sync {
    /// Search for images matching a query.
    async fn search_images(&self, query: &str, count: usize) -> SearchResult<Vec<ImageHit>>;
}

/// Mock web searcher for testing.
///
/// Results are keyed by query only; the recency window is recorded with
/// each call so tests can assert the ladder tightened or relaxed it.
#[derive(Default)]
pub struct MockSearcher {
    results: std::sync::RwLock<std::collections::HashMap<String, Vec<SearchHit>>>,
    images: std::sync::RwLock<std::collections::HashMap<String, Vec<ImageHit>>>,
    calls: std::sync::RwLock<Vec<(String, Recency)>>,
}

impl MockSearcher {
    /// Create a new mock searcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add web results for a query.
    pub fn with_results(self, query: &str, results: Vec<SearchHit>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Add image results for a query.
    pub fn with_images(self, query: &str, images: Vec<ImageHit>) -> Self {
        self.images
            .write()
            .unwrap()
            .insert(query.to_string(), images);
        self
    }

    /// Queries issued so far, with their recency windows.
    pub fn calls(&self) -> Vec<(String, Recency)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(
        &self,
        query: &str,
        recency: Recency,
        _count: usize,
    ) -> SearchResult<Vec<SearchHit>> {
        self.calls
            .write()
            .unwrap()
            .push((query.to_string(), recency));
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ImageSearcher for MockSearcher {
    async fn search_images(&self, query: &str, _count: usize) -> SearchResult<Vec<ImageHit>> {
        Ok(self
            .images
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_params() {
        assert_eq!(Recency::Day.freshness_param(), Some("pd"));
        assert_eq!(Recency::Week.freshness_param(), Some("pw"));
        assert_eq!(Recency::Month.freshness_param(), Some("pm"));
        assert_eq!(Recency::Any.freshness_param(), None);
    }

    #[test]
    fn test_snippet_text_joins_description_first() {
        let hit = SearchHit::new("https://example.com")
            .with_description("lead snippet")
            .with_snippet("second")
            .with_snippet("third");
        assert_eq!(hit.snippet_text(), "lead snippet second third");
    }

    #[tokio::test]
    async fn test_mock_records_recency() {
        let searcher = MockSearcher::new()
            .with_results("mayor budget", vec![SearchHit::new("https://a.com")]);

        let hits = searcher.search("mayor budget", Recency::Week, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            searcher.calls(),
            vec![("mayor budget".to_string(), Recency::Week)]
        );
    }
}
