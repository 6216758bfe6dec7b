//! Quota-limited credential pool with priority rotation.
//!
//! Providers hand out multiple API keys with separate quotas (free tiers
//! before paid). The pool owns every credential for a capability, tracks
//! usage, and applies one backoff protocol everywhere:
//!
//! - first rate-limit on a credential: caller sleeps a short fixed interval
//!   and retries the same credential once;
//! - second consecutive rate-limit: the credential is exhausted for the
//!   rest of the run and the pool moves to the next one;
//! - auth or billing failure: exhausted immediately, no retry.
//!
//! Counters are process-lifetime only; a restart resets them. That makes
//! quota tracking an approximation, not a guarantee, and deployments should
//! budget accordingly.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::security::SecretString;

/// Capability tag for web search credentials.
pub const CAP_WEB_SEARCH: &str = "web-search";

/// Capability tag for image search credentials.
pub const CAP_IMAGE_SEARCH: &str = "image-search";

/// One API credential with its quota.
pub struct Credential {
    /// Stable identifier for reporting outcomes ("brave-search", ...)
    pub id: String,

    /// Capability this credential serves
    pub capability: String,

    /// The key itself
    pub api_key: SecretString,

    /// Request quota; `None` means unlimited (paid tier)
    pub quota: Option<u32>,
}

impl Credential {
    /// Create a new credential.
    pub fn new(
        id: impl Into<String>,
        capability: impl Into<String>,
        api_key: impl Into<SecretString>,
        quota: Option<u32>,
    ) -> Self {
        Self {
            id: id.into(),
            capability: capability.into(),
            api_key: api_key.into(),
            quota,
        }
    }
}

/// Outcome of one request made with a leased credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Request succeeded; one unit of quota consumed
    Success,
    /// Provider returned 429
    RateLimited,
    /// Provider returned 401/403
    AuthFailed,
    /// Provider signalled quota/billing exhaustion (402)
    QuotaExhausted,
}

/// What the caller should do after reporting a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Sleep this long, then retry the same credential once
    RetryAfter(Duration),
    /// Credential is out for the run; acquire the next one
    Exhausted,
}

/// A leased credential handed to the caller.
#[derive(Clone)]
pub struct Lease {
    pub id: String,
    pub api_key: SecretString,
}

struct Slot {
    cred: Credential,
    used: u32,
    consecutive_rate_limits: u32,
    exhausted: bool,
}

impl Slot {
    fn usable(&self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.cred.quota {
            Some(limit) => self.used < limit,
            None => true,
        }
    }
}

/// Shared pool of prioritized credentials per capability.
///
/// Passed by `Arc` into every client that spends quota, never ambient
/// state, so tests can inject synthetic pools. The mutex makes counters
/// safe if a deployment adds a bounded worker pool.
pub struct KeyPool {
    slots: Mutex<Vec<Slot>>,
    retry_interval: Duration,
}

impl Default for KeyPool {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPool {
    /// Create an empty pool with the default rate-limit retry interval.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            retry_interval: Duration::from_secs(2),
        }
    }

    /// Set the sleep interval recommended after a first rate limit.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Add a credential. Declaration order is priority order: free tiers
    /// should be added before paid ones.
    pub fn with_credential(self, cred: Credential) -> Self {
        self.slots.lock().unwrap().push(Slot {
            cred,
            used: 0,
            consecutive_rate_limits: 0,
            exhausted: false,
        });
        self
    }

    /// Whether any credential exists for a capability, exhausted or not.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.cred.capability == capability)
    }

    /// Lease the highest-priority usable credential for a capability.
    pub fn acquire(&self, capability: &str) -> Option<Lease> {
        let slots = self.slots.lock().unwrap();
        slots
            .iter()
            .find(|s| s.cred.capability == capability && s.usable())
            .map(|s| Lease {
                id: s.cred.id.clone(),
                api_key: s.cred.api_key.clone(),
            })
    }

    /// Report the outcome of a request made with a leased credential.
    ///
    /// Returns backoff advice only for `RateLimited`; the pool never sleeps
    /// itself, so rotation loops stay explicit and bounded at the caller.
    pub fn report(&self, id: &str, outcome: KeyOutcome) -> Option<Backoff> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.iter_mut().find(|s| s.cred.id == id)?;

        match outcome {
            KeyOutcome::Success => {
                slot.used += 1;
                slot.consecutive_rate_limits = 0;
                if let Some(limit) = slot.cred.quota {
                    if slot.used >= limit {
                        debug!(credential = %id, "credential quota reached");
                        slot.exhausted = true;
                    }
                }
                None
            }
            KeyOutcome::RateLimited => {
                slot.consecutive_rate_limits += 1;
                if slot.consecutive_rate_limits >= 2 {
                    warn!(credential = %id, "second consecutive rate limit, retiring credential");
                    slot.exhausted = true;
                    Some(Backoff::Exhausted)
                } else {
                    Some(Backoff::RetryAfter(self.retry_interval))
                }
            }
            KeyOutcome::AuthFailed | KeyOutcome::QuotaExhausted => {
                warn!(credential = %id, ?outcome, "retiring credential");
                slot.exhausted = true;
                None
            }
        }
    }

    /// Usage counter for a credential (test/observability accessor).
    pub fn usage(&self, id: &str) -> Option<u32> {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.cred.id == id)
            .map(|s| s.used)
    }

    /// Whether a credential has been retired for this run.
    pub fn is_exhausted(&self, id: &str) -> Option<bool> {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.cred.id == id)
            .map(|s| s.exhausted)
    }
}
