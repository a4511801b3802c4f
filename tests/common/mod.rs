//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use precis::{
    Generation, KvStore, MemoryStore, PrecisError, Result, SummaryProvider, SummaryRequest,
    Usage,
};

pub const SUMMARY: &str = "A short abstractive summary of the text.";
pub const MODEL: &str = "mock-model";

pub const ARTICLE: &str = "The city council approved a new transit plan on Monday. \
The plan adds three bus lines and extends the tram network to the airport. \
Council members said the transit plan would reduce traffic in the city center. \
Construction of the tram extension will begin next spring. \
Residents can comment on the bus routes until the end of the month.";

/// Provider that fails `fail_count` times, then succeeds.
pub struct MockProvider {
    fail_count: u32,
    fail_with: fn() -> PrecisError,
    delay: Option<Duration>,
    probe_ok: bool,
    calls: AtomicU32,
}

impl MockProvider {
    /// Always succeeds.
    pub fn ok() -> Self {
        Self::failing(0, || PrecisError::Http("unused".into()))
    }

    /// Fails `fail_count` times with `fail_with`, then succeeds.
    pub fn failing(fail_count: u32, fail_with: fn() -> PrecisError) -> Self {
        Self {
            fail_count,
            fail_with,
            delay: None,
            probe_ok: true,
            calls: AtomicU32::new(0),
        }
    }

    /// Never succeeds.
    pub fn always_failing(fail_with: fn() -> PrecisError) -> Self {
        Self::failing(u32::MAX, fail_with)
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_probe(mut self) -> Self {
        self.probe_ok = false;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SummaryProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        MODEL
    }

    async fn generate(&self, _request: &SummaryRequest) -> Result<Generation> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if n < self.fail_count {
            return Err((self.fail_with)());
        }
        Ok(Generation {
            summary: SUMMARY.to_string(),
            usage: Usage::new(120, 30),
            model: MODEL.to_string(),
        })
    }

    async fn probe(&self) -> Result<()> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(PrecisError::Http("connection refused".into()))
        }
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(PrecisError::Store("connection refused".into()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(PrecisError::Store("connection refused".into()))
    }

    async fn incr(&self, _key: &str) -> Result<i64> {
        Err(PrecisError::Store("connection refused".into()))
    }

    async fn ping(&self) -> Result<()> {
        Err(PrecisError::Store("connection refused".into()))
    }
}

/// In-memory store that counts writes to summary keys.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    summary_writes: AtomicU32,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary_writes(&self) -> u32 {
        self.summary_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if key.starts_with(precis::cache::KEY_PREFIX) {
            self.summary_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set_ex(key, value, ttl).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.incr(key).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

/// Memory store whose `incr` lands `delay` after it is issued.
pub struct SlowIncrStore {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowIncrStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl KvStore for SlowIncrStore {
    fn name(&self) -> &str {
        "slow-incr"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.inner.set_ex(key, value, ttl).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        tokio::time::sleep(self.delay).await;
        self.inner.incr(key).await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}
