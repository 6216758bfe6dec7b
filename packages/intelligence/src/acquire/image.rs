//! Lead-image resolution for stories.

use std::sync::Arc;

use tracing::debug;

use crate::acquire::chain::AcquiredContent;
use crate::traits::searcher::ImageSearcher;
use crate::types::item::ContentItem;

/// Resolves an image for a story, cheapest source first: the feed's own
/// image, then the one mined from the article page, then image search by
/// title. Image search is optional; stories without one still ship.
pub struct ImageFinder {
    searcher: Option<Arc<dyn ImageSearcher>>,
    search_count: usize,
}

impl ImageFinder {
    /// Create a finder with no search backend. Only feed and page images
    /// will be used.
    pub fn new() -> Self {
        Self {
            searcher: None,
            search_count: 3,
        }
    }

    /// Enable image search as the last step.
    pub fn with_searcher(mut self, searcher: Arc<dyn ImageSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    /// Resolve an image URL for one story, if any source has one.
    pub async fn resolve(&self, item: &ContentItem, content: &AcquiredContent) -> Option<String> {
        if let Some(url) = &item.image_url {
            return Some(url.clone());
        }
        if let Some(url) = &content.image_url {
            return Some(url.clone());
        }

        let searcher = self.searcher.as_ref()?;
        match searcher.search_images(&item.title, self.search_count).await {
            Ok(hits) => hits.into_iter().next().map(|h| h.url),
            Err(e) => {
                debug!(title = %item.title, error = %e, "image search failed");
                None
            }
        }
    }
}

impl Default for ImageFinder {
    fn default() -> Self {
        Self::new()
    }
}
