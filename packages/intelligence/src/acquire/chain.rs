//! Ordered fallback ladder for getting article text.
//!
//! Scrape first; when that comes up short or blocked, fall back to web
//! search with progressively looser queries; as a last resort accept the
//! feed's own summary. Each step has a quality gate, and the chain records
//! which step produced the text so downstream consumers know what they got.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::fetch::{mine_article, MinedArticle};
use crate::traits::fetcher::PageFetcher;
use crate::traits::searcher::{Recency, WebSearcher};
use crate::types::item::ContentItem;

/// How the article text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Mined from the article page itself
    Scraped,
    /// Assembled from web search snippets
    SearchSnippets,
    /// The feed's own summary, verbatim
    FeedSummary,
}

impl Provenance {
    /// Short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Scraped => "scraped",
            Provenance::SearchSnippets => "search",
            Provenance::FeedSummary => "feed-summary",
        }
    }
}

/// Article text plus whatever page metadata came with it.
#[derive(Debug, Clone)]
pub struct AcquiredContent {
    /// The text to extract from
    pub text: String,

    /// Which ladder step produced it
    pub provenance: Provenance,

    /// Title mined from the page, when scraped
    pub title: Option<String>,

    /// Published date mined from the page, when scraped
    pub published: Option<String>,

    /// Lead image mined from the page, when scraped
    pub image_url: Option<String>,
}

impl AcquiredContent {
    fn from_text(text: String, provenance: Provenance) -> Self {
        Self {
            text,
            provenance,
            title: None,
            published: None,
            image_url: None,
        }
    }

    fn from_mined(text: String, mined: MinedArticle) -> Self {
        Self {
            text,
            provenance: Provenance::Scraped,
            title: mined.title,
            published: mined.published,
            image_url: mined.image_url,
        }
    }
}

/// Thresholds and query shaping for the ladder.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Minimum usable article text, in characters
    pub min_content_chars: usize,

    /// Minimum feed summary accepted by the last-resort step
    pub min_summary_chars: usize,

    /// Results requested per search query
    pub search_count: usize,

    /// Word count for the first shortened query
    pub long_query_words: usize,

    /// Word count for the loosest query
    pub short_query_words: usize,

    /// Recency window for the fresh search steps
    pub recency: Recency,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            min_content_chars: 300,
            min_summary_chars: 50,
            search_count: 5,
            long_query_words: 10,
            short_query_words: 5,
            recency: Recency::Week,
        }
    }
}

/// The scrape-then-search-then-summary ladder.
pub struct AcquisitionChain {
    fetcher: Arc<dyn PageFetcher>,
    searcher: Arc<dyn WebSearcher>,
    config: ChainConfig,
}

impl AcquisitionChain {
    /// Create a chain over a fetcher and a searcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>, searcher: Arc<dyn WebSearcher>) -> Self {
        Self {
            fetcher,
            searcher,
            config: ChainConfig::default(),
        }
    }

    /// Override the default thresholds.
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Walk the ladder for one item. Returns `None` when every step fails,
    /// which means the item is skipped, not that the run failed.
    pub async fn acquire(&self, item: &ContentItem) -> Option<AcquiredContent> {
        // 1. Direct scrape.
        if let Some(content) = self.try_scrape(item).await {
            return Some(content);
        }

        // 2-5. Search ladder: exact fresh, shortened fresh, exact any,
        // shortened-further any. The relaxed retries only exist when the
        // configured window actually constrains something; with `Any` they
        // would repeat the same queries and burn quota for nothing.
        let exact = format!("\"{}\"", item.title);
        let long_query = shorten(&item.title, self.config.long_query_words);
        let short_query = shorten(&item.title, self.config.short_query_words);

        let mut steps: Vec<(&str, Recency)> = vec![
            (&exact, self.config.recency),
            (&long_query, self.config.recency),
        ];
        if self.config.recency != Recency::Any {
            steps.push((&exact, Recency::Any));
            steps.push((&short_query, Recency::Any));
        }

        for (query, recency) in steps {
            if let Some(text) = self.try_search(query, recency).await {
                debug!(url = %item.url, query, "content recovered from search snippets");
                return Some(AcquiredContent::from_text(text, Provenance::SearchSnippets));
            }
        }

        // 6. Feed summary, if substantial enough.
        if let Some(summary) = &item.summary {
            let summary = summary.trim();
            if summary.len() >= self.config.min_summary_chars {
                debug!(url = %item.url, "falling back to feed summary");
                return Some(AcquiredContent::from_text(
                    summary.to_string(),
                    Provenance::FeedSummary,
                ));
            }
        }

        warn!(url = %item.url, title = %item.title, "no usable content from any source");
        None
    }

    async fn try_scrape(&self, item: &ContentItem) -> Option<AcquiredContent> {
        let page = match self.fetcher.fetch(&item.url).await {
            Ok(page) => page,
            Err(e) => {
                debug!(url = %item.url, error = %e, "scrape failed, falling through");
                return None;
            }
        };

        let mined = mine_article(&page.html);
        if mined.text.len() >= self.config.min_content_chars {
            let text = mined.text.clone();
            Some(AcquiredContent::from_mined(text, mined))
        } else {
            debug!(
                url = %item.url,
                chars = mined.text.len(),
                "scraped text too short, falling through"
            );
            None
        }
    }

    async fn try_search(&self, query: &str, recency: Recency) -> Option<String> {
        let hits = match self
            .searcher
            .search(query, recency, self.config.search_count)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, error = %e, "search step failed, falling through");
                return None;
            }
        };

        let text = hits
            .iter()
            .map(|h| h.snippet_text())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        if text.len() >= self.config.min_content_chars {
            Some(text)
        } else {
            None
        }
    }
}

fn shorten(title: &str, words: usize) -> String {
    title
        .split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fetcher::MockFetcher;
    use crate::traits::searcher::{MockSearcher, SearchHit};

    const TITLE: &str = "Mayor unveils sweeping new city budget with transit focus this fall";
    const URL: &str = "https://news.example.com/budget";

    fn item() -> ContentItem {
        ContentItem::new(TITLE, URL).with_source("Example News")
    }

    fn long_html() -> String {
        let para = "The mayor presented a draft budget on Tuesday that raises spending on \
                    road maintenance and public transit across the city for the coming year.";
        format!("<html><body><article><p>{para}</p><p>{para}</p><p>{para}</p></article></body></html>")
    }

    fn long_snippet() -> SearchHit {
        let mut hit = SearchHit::new("https://mirror.example.com/budget");
        hit.description = Some("x".repeat(350));
        hit
    }

    #[tokio::test]
    async fn test_scrape_succeeds_first() {
        let fetcher = Arc::new(MockFetcher::new().with_page(URL, &long_html()));
        let searcher = Arc::new(MockSearcher::new());
        let chain = AcquisitionChain::new(fetcher, searcher.clone());

        let content = chain.acquire(&item()).await.unwrap();
        assert_eq!(content.provenance, Provenance::Scraped);
        assert!(content.text.contains("draft budget"));
        // Search never consulted.
        assert!(searcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_scrape_falls_to_exact_search() {
        let fetcher = Arc::new(MockFetcher::new().with_blocked(URL, 403));
        let exact = format!("\"{TITLE}\"");
        let searcher = Arc::new(MockSearcher::new().with_results(&exact, vec![long_snippet()]));
        let chain = AcquisitionChain::new(fetcher, searcher.clone());

        let content = chain.acquire(&item()).await.unwrap();
        assert_eq!(content.provenance, Provenance::SearchSnippets);

        let calls = searcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (exact, Recency::Week));
    }

    #[tokio::test]
    async fn test_ladder_descends_through_queries() {
        let fetcher = Arc::new(MockFetcher::new());
        let short_query = shorten(TITLE, 5);
        let searcher =
            Arc::new(MockSearcher::new().with_results(&short_query, vec![long_snippet()]));
        let chain = AcquisitionChain::new(fetcher, searcher.clone());

        let content = chain.acquire(&item()).await.unwrap();
        assert_eq!(content.provenance, Provenance::SearchSnippets);

        // All four search steps ran; only the last matched. Recency loosens
        // from the configured window to unconstrained.
        let calls = searcher.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].1, Recency::Week);
        assert_eq!(calls[1].1, Recency::Week);
        assert_eq!(calls[2].1, Recency::Any);
        assert_eq!(calls[3].1, Recency::Any);
        assert_eq!(calls[3].0, short_query);
    }

    #[tokio::test]
    async fn test_any_window_skips_relaxed_retries() {
        let fetcher = Arc::new(MockFetcher::new());
        let searcher = Arc::new(MockSearcher::new());
        let chain = AcquisitionChain::new(fetcher, searcher.clone()).with_config(ChainConfig {
            recency: Recency::Any,
            ..ChainConfig::default()
        });

        assert!(chain.acquire(&item()).await.is_none());

        // Already unconstrained: no query is issued twice.
        let calls = searcher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (format!("\"{TITLE}\""), Recency::Any));
        assert_eq!(calls[1], (shorten(TITLE, 10), Recency::Any));
    }

    #[tokio::test]
    async fn test_short_scrape_falls_through() {
        let html = "<html><body><article><p>Too short to be a real article body but long enough paragraph.</p></article></body></html>";
        let fetcher = Arc::new(MockFetcher::new().with_page(URL, html));
        let searcher = Arc::new(MockSearcher::new());
        let chain = AcquisitionChain::new(fetcher, searcher.clone());

        let mut it = item();
        it.summary = Some("A summary comfortably longer than the fifty character minimum bar.".to_string());

        let content = chain.acquire(&it).await.unwrap();
        assert_eq!(content.provenance, Provenance::FeedSummary);
    }

    #[tokio::test]
    async fn test_feed_summary_below_minimum_rejected() {
        let fetcher = Arc::new(MockFetcher::new());
        let searcher = Arc::new(MockSearcher::new());
        let chain = AcquisitionChain::new(fetcher, searcher);

        let mut it = item();
        it.summary = Some("Too short.".to_string());

        assert!(chain.acquire(&it).await.is_none());
    }

    #[tokio::test]
    async fn test_total_failure_returns_none() {
        let fetcher = Arc::new(MockFetcher::new());
        let searcher = Arc::new(MockSearcher::new());
        let chain = AcquisitionChain::new(fetcher, searcher);

        assert!(chain.acquire(&item()).await.is_none());
    }
}
