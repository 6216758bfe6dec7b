//! Input sources.

pub mod feed;

pub use feed::{FeedReader, FeedSource};
