//! Brave Search clients backed by the credential pool.
//!
//! Every request leases a credential from the `KeyPool` and reports its
//! outcome back, so quota tracking and the rate-limit strike policy live in
//! one place. Rotation is a bounded loop, never recursion: rate limits sleep
//! and retry per the pool's advice, auth failures retire the credential and
//! move on, and running out of credentials surfaces as `NoCredentials`.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SearchError, SearchResult};
use crate::keypool::{Backoff, KeyOutcome, KeyPool, CAP_IMAGE_SEARCH, CAP_WEB_SEARCH};
use crate::traits::searcher::{ImageHit, ImageSearcher, Recency, SearchHit, WebSearcher};

const WEB_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const IMAGE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/images/search";

/// Upper bound on lease/retry iterations for one logical query.
const MAX_ATTEMPTS: usize = 8;

#[derive(Deserialize)]
struct WebResponse {
    #[serde(default)]
    web: Option<WebSection>,
}

#[derive(Deserialize)]
struct WebSection {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Deserialize)]
struct WebResult {
    url: String,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    extra_snippets: Vec<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    results: Vec<ImageResult>,
}

#[derive(Deserialize)]
struct ImageResult {
    title: Option<String>,
    properties: Option<ImageProperties>,
}

#[derive(Deserialize)]
struct ImageProperties {
    url: Option<String>,
}

/// Brave Search client for web and image queries.
pub struct BraveSearch {
    pool: Arc<KeyPool>,
    client: reqwest::Client,
}

impl BraveSearch {
    /// Create a new client over a credential pool.
    pub fn new(pool: Arc<KeyPool>) -> Self {
        Self {
            pool,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Run one GET against a Brave endpoint with credential rotation.
    ///
    /// Returns the response body on 200. Each iteration leases the current
    /// best credential; outcomes feed back into the pool, which decides
    /// between a short sleep-and-retry and moving to the next credential.
    async fn get_with_rotation(
        &self,
        capability: &str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> SearchResult<String> {
        for _ in 0..MAX_ATTEMPTS {
            let lease = self.pool.acquire(capability).ok_or_else(|| {
                SearchError::NoCredentials {
                    capability: capability.to_string(),
                }
            })?;

            let response = self
                .client
                .get(endpoint)
                .header("Accept", "application/json")
                .header("X-Subscription-Token", lease.api_key.expose())
                .query(query)
                .send()
                .await
                .map_err(|e| SearchError::Http(Box::new(e)))?;

            let status = response.status().as_u16();
            match status {
                200 => {
                    self.pool.report(&lease.id, KeyOutcome::Success);
                    return response
                        .text()
                        .await
                        .map_err(|e| SearchError::Http(Box::new(e)));
                }
                429 => {
                    match self.pool.report(&lease.id, KeyOutcome::RateLimited) {
                        Some(Backoff::RetryAfter(wait)) => {
                            debug!(credential = %lease.id, ?wait, "search rate limited, retrying");
                            tokio::time::sleep(wait).await;
                        }
                        _ => {
                            warn!(credential = %lease.id, "search credential retired after rate limits");
                        }
                    }
                }
                401 | 403 => {
                    warn!(credential = %lease.id, status, "search credential rejected");
                    self.pool.report(&lease.id, KeyOutcome::AuthFailed);
                }
                _ => return Err(SearchError::Api { status }),
            }
        }

        Err(SearchError::NoCredentials {
            capability: capability.to_string(),
        })
    }
}

#[async_trait]
impl WebSearcher for BraveSearch {
    async fn search(
        &self,
        query: &str,
        recency: Recency,
        count: usize,
    ) -> SearchResult<Vec<SearchHit>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("count", count.to_string()),
            ("extra_snippets", "true".to_string()),
        ];
        if let Some(freshness) = recency.freshness_param() {
            params.push(("freshness", freshness.to_string()));
        }

        let body = self
            .get_with_rotation(CAP_WEB_SEARCH, WEB_ENDPOINT, &params)
            .await?;

        let parsed: WebResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Http(Box::new(e)))?;

        let hits = parsed
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .map(|r| {
                let mut hit = SearchHit::new(r.url);
                if let Some(title) = r.title {
                    hit = hit.with_title(title);
                }
                if let Some(description) = r.description {
                    hit = hit.with_description(description);
                }
                hit.extra_snippets = r.extra_snippets;
                hit
            })
            .collect();

        Ok(hits)
    }
}

#[async_trait]
impl ImageSearcher for BraveSearch {
    async fn search_images(&self, query: &str, count: usize) -> SearchResult<Vec<ImageHit>> {
        let params = vec![("q", query.to_string()), ("count", count.to_string())];

        let body = self
            .get_with_rotation(CAP_IMAGE_SEARCH, IMAGE_ENDPOINT, &params)
            .await?;

        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Http(Box::new(e)))?;

        let hits = parsed
            .results
            .into_iter()
            .filter_map(|r| {
                let url = r.properties.and_then(|p| p.url)?;
                Some(ImageHit {
                    url,
                    title: r.title,
                })
            })
            .collect();

        Ok(hits)
    }
}
