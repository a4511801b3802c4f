//! Builder for configuring summarizer instances

use std::sync::Arc;
use std::time::Duration;

use super::Summarizer;
use crate::cache::{CacheConfig, SummaryCache};
use crate::extractive::{ExtractiveSummarizer, ResourceLanguage};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::providers::{OpenAiProvider, RetryConfig, RetryingProvider, SummaryProvider};
use crate::store::KvStore;
use crate::{PrecisError, Result};

/// Builder for [`Summarizer`].
///
/// ```rust,no_run
/// # use precis::{MemoryStore, Summarizer};
/// # use std::sync::Arc;
/// let summarizer = Summarizer::builder()
///     .openai("sk-your-key")
///     .store(Arc::new(MemoryStore::new()))
///     .build()?;
/// # Ok::<(), precis::PrecisError>(())
/// ```
pub struct SummarizerBuilder {
    openai_key: Option<String>,
    openai_base_url: Option<String>,
    model: Option<String>,
    llm_timeout: Option<Duration>,
    provider: Option<Arc<dyn SummaryProvider>>,
    retry: RetryConfig,
    primary_budget: Option<Duration>,
    store: Option<Arc<dyn KvStore>>,
    cache: CacheConfig,
    rate_limit: RateLimitConfig,
    default_language: ResourceLanguage,
}

impl Default for SummarizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SummarizerBuilder {
    pub fn new() -> Self {
        Self {
            openai_key: None,
            openai_base_url: None,
            model: None,
            llm_timeout: None,
            provider: None,
            retry: RetryConfig::default(),
            primary_budget: None,
            store: None,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            default_language: ResourceLanguage::Spanish,
        }
    }

    /// Use the OpenAI Responses API as the primary provider.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Override the OpenAI base URL.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Model for the OpenAI provider.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Per-call timeout for the OpenAI provider.
    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    /// Use a custom primary provider. Takes precedence over [`openai`](Self::openai).
    pub fn provider(mut self, provider: Arc<dyn SummaryProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Retry policy for the primary provider.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Upper bound on the whole primary stage, retries and backoff
    /// included, measured from pipeline entry. When it runs out the request
    /// is answered by the extractive fallback. Unbounded by default.
    pub fn primary_budget(mut self, budget: Duration) -> Self {
        self.primary_budget = Some(budget);
        self
    }

    /// Shared store for the cache and the rate limiter. Without one, caching
    /// and rate limiting are disabled.
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Language the extractive fallback assumes for `auto` requests.
    pub fn default_language(mut self, language: ResourceLanguage) -> Self {
        self.default_language = language;
        self
    }

    /// Build the summarizer.
    pub fn build(self) -> Result<Summarizer> {
        let primary: Arc<dyn SummaryProvider> = match (self.provider, self.openai_key) {
            (Some(provider), _) => provider,
            (None, Some(key)) => {
                let mut openai = match self.openai_base_url {
                    Some(url) => OpenAiProvider::with_base_url(key, url),
                    None => OpenAiProvider::new(key),
                };
                if let Some(model) = self.model {
                    openai = openai.model(model);
                }
                if let Some(timeout) = self.llm_timeout {
                    openai = openai.timeout(timeout);
                }
                Arc::new(openai)
            }
            (None, None) => {
                return Err(PrecisError::Configuration(
                    "no summary provider configured".to_string(),
                ));
            }
        };

        let (cache, limiter) = match &self.store {
            Some(store) => (
                SummaryCache::new(store.clone(), self.cache),
                RateLimiter::new(store.clone(), self.rate_limit),
            ),
            None => (SummaryCache::disabled(), RateLimiter::disabled()),
        };

        Ok(Summarizer {
            limiter,
            cache,
            provider: Arc::new(RetryingProvider::new(primary, self.retry)),
            fallback: ExtractiveSummarizer::new().default_language(self.default_language),
            store: self.store,
            primary_budget: self.primary_budget,
        })
    }
}
