//! Provider trait for abstractive summarization backends.
//!
//! A provider performs exactly one remote call per invocation and reports
//! failures through [`PrecisError`](crate::PrecisError) variants that
//! classify cleanly (see [`PrecisError::class`](crate::PrecisError::class)).
//! Retrying is layered on top by [`RetryingProvider`](super::RetryingProvider).

use async_trait::async_trait;

use crate::Result;
use crate::types::{Generation, SummaryRequest};

/// Backend that turns a validated request into a summary.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Model identifier reported on successful generations.
    fn model(&self) -> &str;

    /// Summarize the request's text.
    ///
    /// Must return `InvalidResponse` rather than `Ok` when the produced
    /// text is unusable.
    async fn generate(&self, request: &SummaryRequest) -> Result<Generation>;

    /// Cheap connectivity check for health reporting. Never retried.
    async fn probe(&self) -> Result<()>;
}
