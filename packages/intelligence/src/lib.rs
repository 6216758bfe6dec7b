//! News Intelligence Pipeline
//!
//! A library for turning raw news feeds into structured, routed
//! intelligence records:
//!
//! 1. **Acquire** - scrape the article, falling back through web search to
//!    the feed's own summary when pages are blocked or thin
//! 2. **Extract** - structured analysis from LLM providers with ordered
//!    provider/model failover
//! 3. **Route** - pick the destination collection from the detected niche
//! 4. **Persist** - idempotent writes keyed on the article URL, so reruns
//!    add zero rows
//!
//! External spend (search quota, LLM calls) is mediated by a credential
//! pool with explicit quota and backoff rules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use intelligence::{
//!     AcquisitionChain, BraveSearch, DedupUpsertEngine, ExtractionOrchestrator,
//!     HttpFetcher, KeyPool, Credential, OpenAiChatModel, Pipeline, PostgrestStore,
//!     ProviderPlan,
//! };
//!
//! let pool = Arc::new(KeyPool::new().with_credential(
//!     Credential::new("brave-search", intelligence::keypool::CAP_WEB_SEARCH, key, Some(2000)),
//! ));
//! let search = Arc::new(BraveSearch::new(pool));
//! let chain = AcquisitionChain::new(Arc::new(HttpFetcher::new()), search);
//!
//! let alibaba = Arc::new(OpenAiChatModel::alibaba(alibaba_key));
//! let orchestrator = ExtractionOrchestrator::new(vec![
//!     ProviderPlan::new(alibaba, &["qwen-plus", "qwen-turbo"]),
//! ]);
//!
//! let store = Arc::new(PostgrestStore::new(supabase_url, supabase_key));
//! let pipeline = Pipeline::new(chain, orchestrator, DedupUpsertEngine::new(store));
//! let report = pipeline.run(&items).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seam traits (fetcher, searcher, LLM, datastore, alerter)
//! - [`keypool`] - Quota-limited credential pool
//! - [`acquire`] - The scrape/search/summary fallback ladder
//! - [`extract`] - Prompts, parsing, provider failover
//! - [`route`] - Niche routing and per-collection payload shapes
//! - [`store`] - Datastore backends and the dedup/upsert engine
//! - [`sources`] - Feed reading
//! - [`pipeline`] - The run loop

pub mod acquire;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod keypool;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod route;
pub mod search;
pub mod security;
pub mod sources;
pub mod store;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{FetchError, IntelError, LlmError, Result, SearchError, StoreError};
pub use keypool::{Backoff, Credential, KeyOutcome, KeyPool, Lease};
pub use security::SecretString;
pub use traits::{
    fetcher::{FetchedPage, MockFetcher, PageFetcher},
    llm::{ChatModel, MockChatModel},
    notifier::{Alerter, MockAlerter},
    searcher::{ImageHit, ImageSearcher, MockSearcher, Recency, SearchHit, WebSearcher},
    store::Datastore,
};
pub use types::{
    analysis::{AnalysisResult, Entity, Incident, Organization, Person, Urgency},
    item::{parse_loose_date, ContentItem},
    route::{ConflictKey, RouteTarget},
};

// Acquisition
pub use acquire::{AcquiredContent, AcquisitionChain, ChainConfig, ImageFinder, Provenance};
pub use fetch::{mine_article, HttpFetcher, MinedArticle, RateLimitedFetcher};
pub use search::BraveSearch;
pub use sources::{FeedReader, FeedSource};

// Extraction
pub use extract::{ExtractionOrchestrator, ExtractionOutcome, ProviderPlan};
pub use llm::OpenAiChatModel;

// Routing and persistence
pub use route::{adapt_row, ContentRouter, StoryRecord};
pub use store::{DedupUpsertEngine, Disposition, MemoryStore, PersistReport, PostgrestStore};

#[cfg(feature = "postgres")]
pub use store::PostgresStore;

// Alerting
pub use notify::DiscordAlerter;

// Pipeline
pub use pipeline::{Pipeline, RunReport};
