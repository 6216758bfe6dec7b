//! Content item types - the seed records the pipeline consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A content item to be processed: one article reference from a feed or
/// crawl, plus whatever the source already knew about it.
///
/// Immutable once produced by acquisition; the URL is the identity of the
/// item within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Article title
    pub title: String,

    /// Canonical article URL (unique within a run)
    pub url: String,

    /// Feed or site the item came from
    pub source: Option<String>,

    /// Raw published date string as the source provided it
    pub published: Option<String>,

    /// Feed-provided summary, used as a last-resort grounding fallback
    pub summary: Option<String>,

    /// Niche hint from the source (feed category), lowercase
    pub niche: Option<String>,

    /// Image URL if the feed already carried one
    pub image_url: Option<String>,
}

impl ContentItem {
    /// Create a new content item.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: None,
            published: None,
            summary: None,
            niche: None,
            image_url: None,
        }
    }

    /// Set the source name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the raw published date.
    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }

    /// Set the feed summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the niche hint (normalized to lowercase).
    pub fn with_niche(mut self, niche: impl Into<String>) -> Self {
        self.niche = Some(niche.into().to_lowercase());
        self
    }

    /// Set the feed-provided image URL.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Loosely-parsed published date, if the raw string is usable.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published.as_deref().and_then(parse_loose_date)
    }

    /// Niche hint, defaulting to "general".
    pub fn niche_hint(&self) -> &str {
        self.niche.as_deref().unwrap_or("general")
    }
}

/// Parse a date string in any of the formats feeds actually emit.
///
/// Accepts RFC 2822 ("Fri, 01 Dec 2025 12:00:00 GMT"), RFC 3339, and bare
/// `YYYY-MM-DD`. Dates with years outside 2020..=2030 are treated as feed
/// garbage and rejected.
pub fn parse_loose_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| ndt.and_utc())
        })?;

    use chrono::Datelike;
    if !(2020..=2030).contains(&parsed.year()) {
        return None;
    }
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_loose_date("Fri, 01 Dec 2025 12:00:00 GMT").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2025-12-01");
    }

    #[test]
    fn test_parse_rfc3339() {
        assert!(parse_loose_date("2025-10-19T00:00:00Z").is_some());
    }

    #[test]
    fn test_parse_date_only() {
        assert!(parse_loose_date("2024-03-02").is_some());
    }

    #[test]
    fn test_rejects_implausible_years() {
        assert!(parse_loose_date("1970-01-01").is_none());
        assert!(parse_loose_date("2099-01-01").is_none());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_loose_date("yesterday").is_none());
        assert!(parse_loose_date("").is_none());
    }

    #[test]
    fn test_niche_hint_defaults_to_general() {
        let item = ContentItem::new("Title", "https://example.com/a");
        assert_eq!(item.niche_hint(), "general");

        let item = item.with_niche("Crime");
        assert_eq!(item.niche_hint(), "crime");
    }
}
