//! Summarization pipeline.
//!
//! [`Summarizer::summarize`] runs each request through five strictly
//! ordered states:
//!
//! 1. **Admission**: the rate limiter may reject with
//!    [`PrecisError::QuotaExceeded`]. This is the only error surfaced.
//! 2. **Cache probe**: a hit is returned immediately.
//! 3. **Primary generation** through the (retrying) provider, optionally
//!    bounded by a budget so the fallback still fits in the caller's
//!    deadline.
//! 4. **Cache population** on primary success, best effort.
//! 5. **Fallback generation** with the extractive summarizer on any
//!    primary failure. Fallback output is never cached.
//!
//! Latency is measured once, from entry to the terminal state.

mod builder;

pub use builder::SummarizerBuilder;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheEntry, SummaryCache};
use crate::extractive::ExtractiveSummarizer;
use crate::limiter::{RateLimiter, credential_prefix};
use crate::providers::SummaryProvider;
use crate::store::KvStore;
use crate::telemetry;
use crate::types::{Generation, SummaryRequest, SummaryResult};
use crate::{PrecisError, Result};

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Primary,
    Cache,
    Fallback,
    Rejected,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Primary => "primary",
            Outcome::Cache => "cache",
            Outcome::Fallback => "fallback",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Orchestrates admission, caching, primary generation and fallback.
///
/// Construct with [`Summarizer::builder`]. All collaborators are owned
/// here; the struct is `Send + Sync` and meant to be shared behind an
/// `Arc` by concurrent request handlers.
pub struct Summarizer {
    limiter: RateLimiter,
    cache: SummaryCache,
    provider: Arc<dyn SummaryProvider>,
    fallback: ExtractiveSummarizer,
    store: Option<Arc<dyn KvStore>>,
    primary_budget: Option<Duration>,
}

impl Summarizer {
    pub fn builder() -> SummarizerBuilder {
        SummarizerBuilder::new()
    }

    /// Summarize a validated request on behalf of `credential`.
    ///
    /// Fails only with [`PrecisError::QuotaExceeded`]. Every provider and
    /// store failure is absorbed.
    pub async fn summarize(
        &self,
        credential: &str,
        request: &SummaryRequest,
    ) -> Result<SummaryResult> {
        let start = Instant::now();
        let who = credential_prefix(credential);

        // 1. Admission
        if !self.limiter.admit(credential).await {
            record(Outcome::Rejected, start.elapsed());
            return Err(PrecisError::QuotaExceeded);
        }

        // 2. Cache probe
        let key = SummaryCache::key_for_request(request);
        if let Some(entry) = self.cache.get(&key).await {
            let latency = start.elapsed();
            record(Outcome::Cache, latency);
            info!(
                credential = who,
                model = %entry.model,
                latency_ms = latency.as_millis() as u64,
                cached = true,
                fallback_used = entry.fallback_used,
                "summary served from cache"
            );
            return Ok(SummaryResult {
                summary: entry.summary,
                usage: entry.usage,
                model: entry.model,
                latency_ms: latency.as_millis() as u64,
                used_fallback: entry.fallback_used,
                served_from_cache: true,
            });
        }

        // 3. Primary generation
        match self.generate_primary(request, start).await {
            Ok(generation) => {
                // 4. Cache population
                let entry = CacheEntry {
                    summary: generation.summary.clone(),
                    usage: generation.usage,
                    model: generation.model.clone(),
                    fallback_used: false,
                };
                self.cache.set(&key, &entry, self.cache.ttl()).await;

                metrics::counter!(telemetry::TOKENS_TOTAL, "direction" => "prompt")
                    .increment(u64::from(generation.usage.prompt_tokens));
                metrics::counter!(telemetry::TOKENS_TOTAL, "direction" => "completion")
                    .increment(u64::from(generation.usage.completion_tokens));

                Ok(self.finish(Outcome::Primary, generation, start, who))
            }
            Err(e) => {
                // 5. Fallback generation
                let reason = e.class().map_or("unclassified", |c| c.as_str());
                metrics::counter!(telemetry::FALLBACKS_TOTAL, "reason" => reason).increment(1);
                warn!(
                    credential = who,
                    provider = self.provider.name(),
                    error_class = reason,
                    error = %e,
                    "primary generation failed, using extractive fallback"
                );
                let generation: Generation =
                    self.fallback.summarize(&request.text, request.language).into();
                Ok(self.finish(Outcome::Fallback, generation, start, who))
            }
        }
    }

    /// Run the primary provider, retries included, inside whatever is
    /// left of the primary budget. An exhausted budget is a `Timeout`.
    async fn generate_primary(
        &self,
        request: &SummaryRequest,
        start: Instant,
    ) -> Result<Generation> {
        let Some(budget) = self.primary_budget else {
            return self.provider.generate(request).await;
        };
        let remaining = budget.saturating_sub(start.elapsed());
        match tokio::time::timeout(remaining, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(PrecisError::Timeout(budget)),
        }
    }

    fn finish(
        &self,
        outcome: Outcome,
        generation: Generation,
        start: Instant,
        who: &str,
    ) -> SummaryResult {
        let latency = start.elapsed();
        record(outcome, latency);
        let used_fallback = outcome == Outcome::Fallback;
        info!(
            credential = who,
            model = %generation.model,
            latency_ms = latency.as_millis() as u64,
            cached = false,
            fallback_used = used_fallback,
            total_tokens = generation.usage.total_tokens,
            "summary generated"
        );
        SummaryResult {
            summary: generation.summary,
            usage: generation.usage,
            model: generation.model,
            latency_ms: latency.as_millis() as u64,
            used_fallback,
            served_from_cache: false,
        }
    }

    /// Probe the primary provider and the shared store.
    ///
    /// The provider probe is a real (unretried) remote call. The store
    /// check is informational and does not affect [`HealthReport::is_ok`].
    pub async fn health(&self) -> HealthReport {
        let start = Instant::now();
        let llm_provider = match self.provider.probe().await {
            Ok(()) => CheckStatus::Ok,
            Err(_) => CheckStatus::Error,
        };
        let store = match &self.store {
            None => CheckStatus::Disabled,
            Some(store) => match store.ping().await {
                Ok(()) => CheckStatus::Ok,
                Err(e) => {
                    warn!(store = store.name(), error = %e, "store health check failed");
                    CheckStatus::Error
                }
            },
        };
        HealthReport {
            llm_provider,
            store,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Name of the primary provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Whether summaries are cached.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }
}

fn record(outcome: Outcome, latency: Duration) {
    metrics::counter!(telemetry::REQUESTS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "outcome" => outcome.as_str())
        .record(latency.as_secs_f64());
}

/// State of one dependency in a [`HealthReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
    Disabled,
}

/// Result of [`Summarizer::health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub llm_provider: CheckStatus,
    pub store: CheckStatus,
    pub latency_ms: u64,
}

impl HealthReport {
    /// `true` when the primary provider answered its probe.
    pub fn is_ok(&self) -> bool {
        self.llm_provider == CheckStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Primary.as_str(), "primary");
        assert_eq!(Outcome::Cache.as_str(), "cache");
        assert_eq!(Outcome::Fallback.as_str(), "fallback");
        assert_eq!(Outcome::Rejected.as_str(), "rejected");
    }

    #[test]
    fn health_ignores_store_state() {
        let report = HealthReport {
            llm_provider: CheckStatus::Ok,
            store: CheckStatus::Error,
            latency_ms: 3,
        };
        assert!(report.is_ok());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["store"], "error");
    }
}
