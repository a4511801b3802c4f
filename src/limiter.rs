//! Per-credential fixed-window rate limiting.
//!
//! The first admitted request in a window creates a counter at 1 that
//! expires with the window. Later requests are admitted and counted while
//! the counter is below the ceiling, and rejected (without counting) once
//! it reaches it. When the counter expires the next request starts a new
//! window.
//!
//! This is a fixed window, not a sliding one: a caller can spend a full
//! quota at the end of one window and another at the start of the next,
//! so up to twice the ceiling can land within one window length across a
//! boundary.
//!
//! The limiter fails open. If the store is missing or errors, every
//! request is admitted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::store::KvStore;
use crate::telemetry;

/// Namespace prefix for counters in the shared store.
pub const KEY_PREFIX: &str = "rate_limit:";

/// Rate limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per credential per window. Default: 100.
    pub max_requests: u64,
    /// Window length. Default: 60s.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-window ceiling.
    pub fn max_requests(mut self, n: u64) -> Self {
        self.max_requests = n;
        self
    }

    /// Set the window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Fixed-window admission control over an optional shared store.
pub struct RateLimiter {
    store: Option<Arc<dyn KvStore>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, config: RateLimitConfig) -> Self {
        Self {
            store: Some(store),
            config,
        }
    }

    /// Limiter that admits everything.
    pub fn disabled() -> Self {
        Self {
            store: None,
            config: RateLimitConfig::default(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decide whether `credential` may make another request now.
    pub async fn admit(&self, credential: &str) -> bool {
        let Some(store) = &self.store else {
            return true;
        };
        let key = format!("{KEY_PREFIX}{credential}");
        let who = credential_prefix(credential);

        let current = match store.get(&key).await {
            Ok(v) => v,
            Err(e) => return self.fail_open(store.name(), "get", &e),
        };

        let Some(raw) = current else {
            if let Err(e) = store.set_ex(&key, "1", self.config.window).await {
                return self.fail_open(store.name(), "set", &e);
            }
            debug!(credential = who, "rate limit window started");
            return true;
        };

        let count: u64 = match raw.parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(credential = who, value = %raw, "unreadable rate limit counter, admitting");
                return true;
            }
        };

        if count >= self.config.max_requests {
            metrics::counter!(telemetry::RATE_LIMIT_REJECTIONS_TOTAL).increment(1);
            warn!(
                credential = who,
                count,
                limit = self.config.max_requests,
                "rate limit exceeded"
            );
            return false;
        }

        match store.incr(&key).await {
            Ok(1) => {
                // The window lapsed between read and increment, so INCR
                // recreated the counter without an expiry.
                if let Err(e) = store.set_ex(&key, "1", self.config.window).await {
                    return self.fail_open(store.name(), "set", &e);
                }
                debug!(credential = who, "rate limit window restarted");
                true
            }
            Ok(n) => {
                debug!(
                    credential = who,
                    count = n,
                    limit = self.config.max_requests,
                    "rate limit incremented"
                );
                true
            }
            Err(e) => self.fail_open(store.name(), "incr", &e),
        }
    }

    fn fail_open(&self, store: &str, operation: &str, error: &crate::PrecisError) -> bool {
        metrics::counter!(
            telemetry::STORE_ERRORS_TOTAL,
            "operation" => format!("rate_limit_{operation}"),
        )
        .increment(1);
        warn!(store, operation, error = %error, "rate limit store unavailable, admitting request");
        true
    }
}

/// First 8 characters of a credential, safe to log.
pub(crate) fn credential_prefix(credential: &str) -> &str {
    match credential.char_indices().nth(8) {
        Some((idx, _)) => &credential[..idx],
        None => credential,
    }
}
