//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

mod common;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use common::{FailingStore, MockProvider};
use precis::{
    MemoryStore, PrecisError, RateLimitConfig, RetryConfig, SummaryRequest, Summarizer,
    telemetry,
};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric name carrying `label=value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Run `fut` with a local debugging recorder and return its output and the
/// captured metrics.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the async work. Callers must run
/// on the multi-thread runtime.
fn capture<F: Future>(fut: F) -> (F::Output, SnapshotVec) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let output = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
    });
    (output, snapshotter.snapshot().into_vec())
}

fn request() -> SummaryRequest {
    SummaryRequest::new(common::ARTICLE)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn primary_request_records_metrics() {
    let (result, snapshot) = capture(async {
        let summarizer = Summarizer::builder()
            .provider(MockProvider::ok().shared())
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        summarizer.summarize("client-a", &request()).await
    });
    assert!(result.is_ok());

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "outcome", "primary"),
        1
    );
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 150);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_LOOKUPS_TOTAL, "result", "miss"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_WRITES_TOTAL, "status", "ok"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hit_records_cache_outcome() {
    let (_, snapshot) = capture(async {
        let summarizer = Summarizer::builder()
            .provider(MockProvider::ok().shared())
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        let _ = summarizer.summarize("client-a", &request()).await;
        summarizer.summarize("client-a", &request()).await
    });

    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "outcome", "cache"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_LOOKUPS_TOTAL, "result", "hit"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn fallback_records_reason_and_retries() {
    let (result, snapshot) = capture(async {
        let summarizer = Summarizer::builder()
            .provider(
                MockProvider::always_failing(|| PrecisError::Api {
                    status: 503,
                    message: "unavailable".into(),
                })
                .shared(),
            )
            .retry(RetryConfig::new().initial_delay(Duration::from_millis(1)))
            .build()
            .unwrap();
        summarizer.summarize("client-a", &request()).await
    });
    assert!(result.unwrap().used_fallback);

    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "outcome", "fallback"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::FALLBACKS_TOTAL, "reason", "remote_api"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::RETRIES_TOTAL, "provider", "mock"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::TOKENS_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn rejection_records_rate_limit_metrics() {
    let (result, snapshot) = capture(async {
        let summarizer = Summarizer::builder()
            .provider(MockProvider::ok().shared())
            .store(Arc::new(MemoryStore::new()))
            .rate_limit(RateLimitConfig::new().max_requests(1))
            .build()
            .unwrap();
        let _ = summarizer.summarize("client-a", &request()).await;
        summarizer.summarize("client-a", &request()).await
    });
    assert!(matches!(result, Err(PrecisError::QuotaExceeded)));

    assert_eq!(counter_total(&snapshot, telemetry::RATE_LIMIT_REJECTIONS_TOTAL), 1);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "outcome", "rejected"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn store_failures_are_counted() {
    let (result, snapshot) = capture(async {
        let summarizer = Summarizer::builder()
            .provider(MockProvider::ok().shared())
            .store(Arc::new(FailingStore))
            .build()
            .unwrap();
        summarizer.summarize("client-a", &request()).await
    });
    assert!(result.is_ok());

    // Limiter get, cache get, cache set.
    assert_eq!(counter_total(&snapshot, telemetry::STORE_ERRORS_TOTAL), 3);
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::CACHE_LOOKUPS_TOTAL,
            "result",
            "unavailable"
        ),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_WRITES_TOTAL, "status", "error"),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let summarizer = Summarizer::builder()
        .provider(MockProvider::ok().shared())
        .build()
        .unwrap();
    let _result = summarizer.summarize("client-a", &request()).await.unwrap();
}
