//! RSS/Atom feed reading.

use chrono::{Duration, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{IntelError, Result};
use crate::types::item::ContentItem;

/// One configured feed.
#[derive(Debug, Clone)]
pub struct FeedSource {
    /// Feed URL
    pub url: String,

    /// Display name for the source; the feed's own title is used when absent
    pub name: Option<String>,

    /// Niche hint applied to every item from this feed
    pub niche: Option<String>,
}

impl FeedSource {
    /// Create a feed source.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            niche: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the niche hint.
    pub fn with_niche(mut self, niche: impl Into<String>) -> Self {
        self.niche = Some(niche.into());
        self
    }
}

/// Fetches and normalizes feeds into content items.
pub struct FeedReader {
    client: reqwest::Client,
    max_age: Option<Duration>,
}

impl Default for FeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedReader {
    /// Create a reader that keeps items from the last 24 hours.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to create HTTP client"),
            max_age: Some(Duration::hours(24)),
        }
    }

    /// Set the recency window; `None` keeps everything.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Fetch one feed and map its entries to items.
    ///
    /// Entries without a link or title are dropped. Entries older than the
    /// recency window are dropped; entries with no parseable date are kept,
    /// since feeds that omit dates are common and usually fresh.
    pub async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<ContentItem>> {
        debug!(url = %source.url, "fetching feed");

        let bytes = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| IntelError::Feed(format!("{}: {e}", source.url)))?
            .bytes()
            .await
            .map_err(|e| IntelError::Feed(format!("{}: {e}", source.url)))?;

        let feed = feed_rs::parser::parse(bytes.as_ref())
            .map_err(|e| IntelError::Feed(format!("{}: {e}", source.url)))?;

        let feed_title = feed.title.map(|t| t.content);
        let source_name = source
            .name
            .clone()
            .or(feed_title)
            .unwrap_or_else(|| source.url.clone());

        let cutoff = self.max_age.map(|age| Utc::now() - age);
        let mut items = Vec::new();

        for entry in feed.entries {
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                continue;
            };
            if url::Url::parse(&link).is_err() {
                debug!(link, "skipping entry with unparseable link");
                continue;
            }
            let Some(title) = entry.title.as_ref().map(|t| t.content.trim().to_string()) else {
                continue;
            };
            if title.is_empty() {
                continue;
            }

            let published = entry.published.or(entry.updated);
            if let (Some(cutoff), Some(published)) = (cutoff, published) {
                if published < cutoff {
                    continue;
                }
            }

            let mut item = ContentItem::new(title, link).with_source(source_name.clone());
            if let Some(published) = published {
                item = item.with_published(published.to_rfc3339());
            }
            if let Some(summary) = entry.summary {
                let text = strip_markup(&summary.content);
                if !text.is_empty() {
                    item = item.with_summary(text);
                }
            }
            if let Some(niche) = &source.niche {
                item = item.with_niche(niche.clone());
            }
            if let Some(image) = media_image(&entry.media) {
                item = item.with_image_url(image);
            }

            items.push(item);
        }

        if items.is_empty() {
            warn!(url = %source.url, "feed produced no usable items");
        }
        Ok(items)
    }
}

/// First media image attached to an entry: media:content, then thumbnail.
fn media_image(media: &[feed_rs::model::MediaObject]) -> Option<String> {
    for object in media {
        for content in &object.content {
            if let Some(url) = &content.url {
                return Some(url.to_string());
            }
        }
        if let Some(thumbnail) = object.thumbnails.first() {
            return Some(thumbnail.image.uri.clone());
        }
    }
    None
}

/// Feed summaries frequently arrive as HTML fragments.
fn strip_markup(text: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    let cleaned = tags.replace_all(text, " ");
    cleaned
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup() {
        let html = "<p>Flood warnings &amp; road closures</p>  <br/> expected";
        assert_eq!(strip_markup(html), "Flood warnings & road closures expected");
    }

    #[test]
    fn test_parse_rss_fixture() {
        let rss = r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
                <title>Example News</title>
                <item>
                    <title>Mayor unveils budget</title>
                    <link>https://e.com/budget</link>
                    <description>&lt;p&gt;A draft budget was presented on Tuesday.&lt;/p&gt;</description>
                </item>
                <item>
                    <link>https://e.com/no-title</link>
                </item>
            </channel></rss>"#;

        let feed = feed_rs::parser::parse(rss.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.title.unwrap().content, "Example News");
        // The second entry has no title and would be dropped by the reader.
        assert!(feed.entries[1].title.is_none());
    }
}
