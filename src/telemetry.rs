//! Telemetry metric name constants.
//!
//! Centralised metric names for the summarization pipeline. Consumers
//! install their own `metrics` recorder (e.g. prometheus, statsd); without
//! a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `precis_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `outcome`: terminal pipeline state: "primary", "cache", "fallback", "rejected"
//! - `provider`: provider name (e.g. "openai")
//! - `reason`: failure class that triggered a fallback (e.g. "timeout")
//! - `direction`: token direction: "prompt" or "completion"

/// Total summarization requests that reached the pipeline.
///
/// Labels: `outcome`.
pub const REQUESTS_TOTAL: &str = "precis_requests_total";

/// Pipeline duration in seconds, entry to terminal state.
///
/// Labels: `outcome`.
pub const REQUEST_DURATION_SECONDS: &str = "precis_request_duration_seconds";

/// Total requests answered by the extractive fallback.
///
/// Labels: `reason`.
pub const FALLBACKS_TOTAL: &str = "precis_fallbacks_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "precis_retries_total";

/// Total tokens consumed by the primary provider.
///
/// Labels: `direction` ("prompt" | "completion").
pub const TOKENS_TOTAL: &str = "precis_tokens_total";

/// Total summary cache lookups.
///
/// Labels: `result` ("hit" | "miss" | "unavailable").
pub const CACHE_LOOKUPS_TOTAL: &str = "precis_cache_lookups_total";

/// Total summary cache writes.
///
/// Labels: `status` ("ok" | "error").
pub const CACHE_WRITES_TOTAL: &str = "precis_cache_writes_total";

/// Total requests rejected by the rate limiter.
pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "precis_rate_limit_rejections_total";

/// Total shared-store failures absorbed by the cache or limiter.
///
/// Labels: `operation`.
pub const STORE_ERRORS_TOTAL: &str = "precis_store_errors_total";
