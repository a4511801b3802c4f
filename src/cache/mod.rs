//! Content-addressed summary cache.
//!
//! Maps a fingerprint of `(text, language, max_output_tokens, tone)` to a
//! previously computed primary summary, stored as JSON in a shared
//! [`KvStore`] with a TTL.
//!
//! # Degradation
//!
//! Caching is a performance optimisation only. When no store is
//! configured, or the store errors, every lookup behaves as a miss and
//! every write as a no-op. [`SummaryCache::lookup`] keeps the distinction
//! ([`CacheLookup::Unavailable`]) for logging; [`SummaryCache::get`]
//! collapses it into `None`.
//!
//! # Key format
//!
//! `summary:` followed by the lowercase hex SHA-256 of
//! `"{text}|{language}|{max_output_tokens}|{tone}"`. Language and tone are
//! fixed tags and the token budget is numeric, so the last three fields
//! can always be split off unambiguously and distinct tuples never share a
//! preimage.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::store::KvStore;
use crate::telemetry;
use crate::types::{Language, SummaryRequest, Tone, Usage};

/// Namespace prefix for summary keys in the shared store.
pub const KEY_PREFIX: &str = "summary:";

/// Configuration for the summary cache.
///
/// ```rust
/// # use precis::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new().ttl(Duration::from_secs(600));
/// assert_eq!(config.ttl, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Namespaced fingerprint of a summary request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for logs.
    pub fn short(&self) -> &str {
        let end = (KEY_PREFIX.len() + 16).min(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted form of a summary. Latency is request-specific and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub summary: String,
    pub usage: Usage,
    pub model: String,
    pub fallback_used: bool,
}

/// Outcome of a cache probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(CacheEntry),
    Miss,
    /// Store disabled or unreachable. Callers proceed as on a miss.
    Unavailable,
}

impl CacheLookup {
    /// Collapse to the entry, treating `Unavailable` like `Miss`.
    pub fn into_entry(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Hit(entry) => Some(entry),
            CacheLookup::Miss | CacheLookup::Unavailable => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Unavailable => "unavailable",
        }
    }
}

/// Best-effort summary cache over an optional shared store.
pub struct SummaryCache {
    store: Option<Arc<dyn KvStore>>,
    config: CacheConfig,
}

impl SummaryCache {
    /// Cache backed by `store`.
    pub fn new(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self {
            store: Some(store),
            config,
        }
    }

    /// Cache that always misses and never writes.
    pub fn disabled() -> Self {
        Self {
            store: None,
            config: CacheConfig::default(),
        }
    }

    /// Whether a backing store is configured.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Deterministic key for a request tuple.
    pub fn key_for(
        text: &str,
        language: Language,
        max_output_tokens: u32,
        tone: Tone,
    ) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(b"|");
        hasher.update(language.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(max_output_tokens.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(tone.as_str().as_bytes());
        CacheKey(format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    /// Key for a whole request.
    pub fn key_for_request(request: &SummaryRequest) -> CacheKey {
        Self::key_for(
            &request.text,
            request.language,
            request.max_output_tokens,
            request.tone,
        )
    }

    /// Probe the cache, distinguishing a miss from an unreachable store.
    pub async fn lookup(&self, key: &CacheKey) -> CacheLookup {
        let result = self.lookup_inner(key).await;
        metrics::counter!(telemetry::CACHE_LOOKUPS_TOTAL, "result" => result.label())
            .increment(1);
        result
    }

    async fn lookup_inner(&self, key: &CacheKey) -> CacheLookup {
        let Some(store) = &self.store else {
            return CacheLookup::Unavailable;
        };
        match store.get(key.as_str()).await {
            Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) => {
                    debug!(key = key.short(), "cache hit");
                    CacheLookup::Hit(entry)
                }
                Err(e) => {
                    warn!(key = key.short(), error = %e, "discarding undecodable cache entry");
                    CacheLookup::Miss
                }
            },
            Ok(None) => {
                debug!(key = key.short(), "cache miss");
                CacheLookup::Miss
            }
            Err(e) => {
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "cache_get")
                    .increment(1);
                warn!(store = store.name(), error = %e, "cache read failed, treating as miss");
                CacheLookup::Unavailable
            }
        }
    }

    /// Look up a cached entry. `None` on miss or store failure alike.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lookup(key).await.into_entry()
    }

    /// Store an entry with the given lifetime.
    ///
    /// Returns whether the write landed. Failures are logged and swallowed.
    pub async fn set(&self, key: &CacheKey, entry: &CacheEntry, ttl: Duration) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let payload = match serde_json::to_string(entry) {
            Ok(p) => p,
            Err(e) => {
                warn!(key = key.short(), error = %e, "failed to encode cache entry");
                return false;
            }
        };
        match store.set_ex(key.as_str(), &payload, ttl).await {
            Ok(()) => {
                metrics::counter!(telemetry::CACHE_WRITES_TOTAL, "status" => "ok").increment(1);
                debug!(key = key.short(), ttl_secs = ttl.as_secs(), "summary cached");
                true
            }
            Err(e) => {
                metrics::counter!(telemetry::CACHE_WRITES_TOTAL, "status" => "error")
                    .increment(1);
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "cache_set")
                    .increment(1);
                warn!(store = store.name(), error = %e, "cache write failed");
                false
            }
        }
    }
}
