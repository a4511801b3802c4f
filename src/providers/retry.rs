//! Retry configuration, delay calculation, and the provider decorator.
//!
//! [`RetryingProvider`] wraps any [`SummaryProvider`] and delegates to the
//! shared `with_retry()` helper, keeping retry logic in a single place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::SummaryProvider;
use crate::telemetry;
use crate::types::{Generation, SummaryRequest};
use crate::{PrecisError, Result};

/// Configuration for retry behaviour on retryable errors.
///
/// Uses exponential backoff without jitter:
///
/// ```rust
/// # use precis::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(3)
///     .initial_delay(Duration::from_millis(200));
/// assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 2.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 1s.
    pub initial_delay: Duration,
    /// Maximum delay between retries, also capping `retry_after` hints. Default: 4s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request). Zero is treated as one.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retrying after attempt `attempt` (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Delay honouring a provider `retry_after` hint, which replaces the
    /// computed backoff but is still capped at `max_delay`.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|d| d.min(self.max_delay))
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Execute an async operation with retry logic.
///
/// Retries errors whose class is retryable (see
/// [`PrecisError::is_retryable`]) up to `config.max_attempts`. Anything
/// else is returned immediately. When attempts run out the last error is
/// returned unchanged.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    operation: &str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err: PrecisError = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        if !err.is_retryable() || attempt + 1 >= max_attempts {
            return Err(err);
        }
        let delay = config.effective_delay(attempt, err.retry_after());
        metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider_name.to_owned())
            .increment(1);
        warn!(
            provider = provider_name,
            operation,
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error_class = err.class().map_or("unclassified", |c| c.as_str()),
            error = %err,
            "retrying after retryable error"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Decorator that wraps a [`SummaryProvider`] with retry logic.
///
/// Only `generate` is retried; `probe` passes straight through so health
/// checks stay fast.
pub struct RetryingProvider {
    inner: Arc<dyn SummaryProvider>,
    config: RetryConfig,
}

impl RetryingProvider {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<dyn SummaryProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl SummaryProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn generate(&self, request: &SummaryRequest) -> Result<Generation> {
        with_retry(&self.config, self.inner.name(), "generate", || {
            self.inner.generate(request)
        })
        .await
    }

    async fn probe(&self) -> Result<()> {
        self.inner.probe().await
    }
}
