//! Precis - LLM summarization with an extractive safety net
//!
//! This crate turns text into summaries through a remote language model
//! and falls back to a local TextRank summarizer whenever the remote call
//! fails. Around that core it provides a per-credential rate limiter and a
//! content-addressed summary cache, both backed by a shared key-value
//! store and both degrading silently when the store is unavailable.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use precis::{MemoryStore, SummaryRequest, Summarizer, Tone};
//!
//! #[tokio::main]
//! async fn main() -> precis::Result<()> {
//!     let summarizer = Summarizer::builder()
//!         .openai("sk-your-key")
//!         .store(Arc::new(MemoryStore::new()))
//!         .build()?;
//!
//!     let request = SummaryRequest::new("Rust is a systems language. It is fast. It is safe.")
//!         .tone(Tone::Concise);
//!     let result = summarizer.summarize("client-key", &request).await?;
//!
//!     println!("{} (fallback: {})", result.summary, result.used_fallback);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod extractive;
pub mod limiter;
pub mod pipeline;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheEntry, CacheKey, CacheLookup, SummaryCache};
pub use error::{FailureClass, PrecisError, Result};
pub use extractive::{ExtractiveSummarizer, ExtractiveSummary, ResourceLanguage};
pub use limiter::{RateLimitConfig, RateLimiter};
pub use pipeline::{CheckStatus, HealthReport, Summarizer, SummarizerBuilder};
pub use providers::{OpenAiProvider, RetryConfig, RetryingProvider, SummaryProvider};
pub use store::{KvStore, MemoryStore};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use types::{Generation, Language, SummaryRequest, SummaryResult, Tone, Usage};
