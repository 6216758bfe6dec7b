//! Regex-based article mining from raw HTML.
//!
//! No DOM parser: chrome is stripped, then a ladder of likely content
//! regions is tried and its paragraphs harvested. Works well enough on
//! news-site markup, which is all this pipeline fetches.

use regex::Regex;

/// Paragraphs at or below this length are navigation labels, bylines or
/// cookie banners, not article text.
const MIN_PARAGRAPH_CHARS: usize = 40;

/// Minimum declared width for a body image to count as article art.
const MIN_IMAGE_WIDTH: u32 = 300;

/// What could be mined out of one HTML page.
#[derive(Debug, Clone, Default)]
pub struct MinedArticle {
    /// Article body text, paragraphs joined by blank lines
    pub text: String,

    /// Best-guess page title
    pub title: Option<String>,

    /// Raw published-date string from page metadata
    pub published: Option<String>,

    /// Lead image URL
    pub image_url: Option<String>,
}

/// Mine article text and metadata from raw HTML.
pub fn mine_article(html: &str) -> MinedArticle {
    let cleaned = strip_noise(html);

    MinedArticle {
        text: extract_text(&cleaned),
        title: extract_title(html),
        published: extract_published(html),
        image_url: extract_image(html),
    }
}

/// Remove scripts, styles and page chrome before text extraction.
fn strip_noise(html: &str) -> String {
    let mut text = html.to_string();
    for tag in ["script", "style", "noscript", "nav", "header", "footer", "aside", "form"] {
        let pattern = Regex::new(&format!(r"(?si)<{tag}[^>]*>.*?</{tag}>")).unwrap();
        text = pattern.replace_all(&text, "").to_string();
    }
    let comments = Regex::new(r"(?s)<!--.*?-->").unwrap();
    comments.replace_all(&text, "").to_string()
}

/// Pick the most likely content region, then harvest its paragraphs.
fn extract_text(cleaned: &str) -> String {
    let region = select_region(cleaned);

    let p_pattern = Regex::new(r"(?si)<p[^>]*>(.*?)</p>").unwrap();
    let paragraphs: Vec<String> = p_pattern
        .captures_iter(region)
        .filter_map(|cap| cap.get(1))
        .map(|m| decode_entities(&strip_tags(m.as_str())))
        .map(|p| p.trim().to_string())
        .filter(|p| p.len() > MIN_PARAGRAPH_CHARS)
        .collect();

    paragraphs.join("\n\n")
}

/// Content-region ladder: `<article>`, then `<main>`, then a div with a
/// content-looking class, then the whole page.
fn select_region(cleaned: &str) -> &str {
    let article = Regex::new(r"(?si)<article[^>]*>(.*?)</article>").unwrap();
    if let Some(m) = article.captures(cleaned).and_then(|c| c.get(1)) {
        return &cleaned[m.range()];
    }

    let main = Regex::new(r"(?si)<main[^>]*>(.*?)</main>").unwrap();
    if let Some(m) = main.captures(cleaned).and_then(|c| c.get(1)) {
        return &cleaned[m.range()];
    }

    let content_div = Regex::new(
        r#"(?si)<div[^>]*class\s*=\s*["'][^"']*(?:article-body|post-content|entry-content|story-body|article__content)[^"']*["'][^>]*>(.*?)</div>"#,
    )
    .unwrap();
    if let Some(m) = content_div.captures(cleaned).and_then(|c| c.get(1)) {
        return &cleaned[m.range()];
    }

    cleaned
}

/// og:title, then the first h1, then the title tag.
fn extract_title(html: &str) -> Option<String> {
    if let Some(title) = meta_content(html, "og:title") {
        return Some(title);
    }

    let h1 = Regex::new(r"(?si)<h1[^>]*>(.*?)</h1>").unwrap();
    if let Some(m) = h1.captures(html).and_then(|c| c.get(1)) {
        let text = decode_entities(&strip_tags(m.as_str())).trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let title = Regex::new(r"(?si)<title[^>]*>(.*?)</title>").unwrap();
    title
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Published-date metadata, as the raw string the page declared.
fn extract_published(html: &str) -> Option<String> {
    for key in ["article:published_time", "og:article:published_time", "date", "publish-date", "publishdate"] {
        if let Some(value) = meta_content(html, key) {
            return Some(value);
        }
    }

    let time_attr = Regex::new(r#"(?si)<time[^>]*datetime\s*=\s*["']([^"']+)["']"#).unwrap();
    time_attr
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Lead image: social-card metadata first, then the first body image with a
/// declared width of at least 300 pixels.
fn extract_image(html: &str) -> Option<String> {
    for key in ["og:image", "twitter:image", "twitter:image:src"] {
        if let Some(url) = meta_content(html, key) {
            if is_usable_image(&url) {
                return Some(url);
            }
        }
    }

    let img = Regex::new(r"(?si)<img[^>]*>").unwrap();
    let src_attr = Regex::new(r#"(?i)src\s*=\s*["']([^"']+)["']"#).unwrap();
    let width_attr = Regex::new(r#"(?i)width\s*=\s*["']?(\d+)"#).unwrap();

    for tag in img.find_iter(html) {
        let tag = tag.as_str();
        let width = width_attr
            .captures(tag)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        if width.map_or(true, |w| w < MIN_IMAGE_WIDTH) {
            continue;
        }
        if let Some(src) = src_attr.captures(tag).and_then(|c| c.get(1)) {
            let src = src.as_str();
            if is_usable_image(src) {
                return Some(src.to_string());
            }
        }
    }

    None
}

fn is_usable_image(url: &str) -> bool {
    !url.starts_with("data:") && !url.ends_with(".svg") && !url.ends_with(".gif")
}

/// Meta tag lookup tolerant of attribute order.
fn meta_content(html: &str, key: &str) -> Option<String> {
    let escaped = regex::escape(key);

    // property/name before content
    let forward = Regex::new(&format!(
        r#"(?si)<meta[^>]*(?:property|name)\s*=\s*["']{escaped}["'][^>]*content\s*=\s*["']([^"']+)["']"#
    ))
    .unwrap();
    if let Some(m) = forward.captures(html).and_then(|c| c.get(1)) {
        return Some(decode_entities(m.as_str()).trim().to_string());
    }

    // content before property/name
    let reversed = Regex::new(&format!(
        r#"(?si)<meta[^>]*content\s*=\s*["']([^"']+)["'][^>]*(?:property|name)\s*=\s*["']{escaped}["']"#
    ))
    .unwrap();
    reversed
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()).trim().to_string())
}

fn strip_tags(html: &str) -> String {
    let tag_pattern = Regex::new(r"<[^>]+>").unwrap();
    tag_pattern.replace_all(html, " ").to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&mdash;", "\u{2014}")
}
