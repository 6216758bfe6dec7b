//! Typed errors for the intelligence pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). The lower-level enums
//! carry the auth/quota/rate-limit distinctions the failover logic depends
//! on: an `LlmError::Auth` escalates past the whole provider, while quota
//! and parse failures only skip the current model.

use thiserror::Error;

/// Top-level errors for pipeline operations.
#[derive(Debug, Error)]
pub enum IntelError {
    /// Page fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Web or image search failed
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    /// LLM provider call failed
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Datastore operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Feed could not be read or parsed
    #[error("feed error: {0}")]
    Feed(String),

    /// Missing or inconsistent configuration
    #[error("config error: {0}")]
    Config(String),

    /// Alert delivery failed. Alerts are best-effort; callers log this
    /// instead of propagating it.
    #[error("notification failed: {0}")]
    Notify(String),
}

/// Errors from direct page fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Anti-bot / paywall response (401, 403, 429). A soft outcome: the
    /// acquisition chain falls through to search instead of aborting.
    #[error("blocked ({status}): {url}")]
    Blocked { url: String, status: u16 },

    /// Non-success status other than a soft block
    #[error("HTTP {status}: {url}")]
    Status { url: String, status: u16 },

    /// Request exceeded the fetch timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },
}

/// Errors from search providers.
///
/// Auth and rate-limit responses never surface here: the key pool absorbs
/// them by retiring or backing off the offending credential, so callers only
/// see `NoCredentials` once every slot is gone.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Every credential for the capability is exhausted
    #[error("no usable credential for capability: {capability}")]
    NoCredentials { capability: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other non-success response
    #[error("search API error ({status})")]
    Api { status: u16 },
}

/// Errors from LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Credential rejected (401/403). Escalates provider-level: remaining
    /// models on the same provider are skipped.
    #[error("provider credential rejected ({status})")]
    Auth { status: u16 },

    /// Quota or billing failure (402). Model-level: the next model may have
    /// a separate quota.
    #[error("provider quota or billing failure")]
    Quota,

    /// Rate limit (429). Model-level, no local retry.
    #[error("provider rate limit hit")]
    RateLimited,

    /// Request exceeded the completion timeout
    #[error("completion timed out")]
    Timeout,

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other non-success response
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response contained no completion text
    #[error("empty completion")]
    NoContent,
}

impl LlmError {
    /// Whether this failure disqualifies the whole provider rather than
    /// just the current model.
    pub fn is_provider_level(&self) -> bool {
        matches!(self, LlmError::Auth { .. })
    }
}

/// Errors from destination datastores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Destination-side validation rejected the payload
    #[error("{schema}.{collection} rejected payload: {message}")]
    Rejected {
        schema: String,
        collection: String,
        message: String,
    },

    /// Existence-probe / insert race, or a duplicate the destination refused
    #[error("persistence conflict in {schema}.{collection} on key {key}")]
    Conflict {
        schema: String,
        collection: String,
        key: String,
    },

    /// Payload could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, IntelError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
