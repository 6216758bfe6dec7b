//! Page fetching and article mining.

pub mod html;
pub mod http;
pub mod rate_limited;

pub use html::{mine_article, MinedArticle};
pub use http::HttpFetcher;
pub use rate_limited::{FetcherExt, RateLimitedFetcher};
