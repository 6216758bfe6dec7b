//! Rate-limited fetcher wrapper.
//!
//! Wraps any `PageFetcher` with rate limiting using the governor crate, so
//! a feed full of links from the same host does not hammer it.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::traits::fetcher::{FetchedPage, PageFetcher};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A fetcher wrapper that enforces rate limits.
pub struct RateLimitedFetcher<F: PageFetcher> {
    inner: F,
    limiter: Arc<DefaultRateLimiter>,
}

impl<F: PageFetcher> RateLimitedFetcher<F> {
    /// Create a new rate-limited fetcher.
    pub fn new(fetcher: F, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        );
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with burst support.
    pub fn with_burst(fetcher: F, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        )
        .allow_burst(NonZeroU32::new(burst).expect("burst must be > 0"));

        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.limiter.until_ready().await;
        self.inner.fetch(url).await
    }
}

/// Extension trait for easy rate limiting.
pub trait FetcherExt: PageFetcher + Sized {
    /// Wrap this fetcher with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, requests_per_second)
    }
}

impl<F: PageFetcher + Sized> FetcherExt for F {}
