//! In-process store backed by moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::Op;

use super::KvStore;
use crate::{PrecisError, Result};

/// Default maximum number of keys held in memory.
const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone)]
struct StoredValue {
    data: String,
    ttl: Option<Duration>,
    /// Whether a write of this value restarts the expiry clock.
    /// `set_ex` does, `incr` does not.
    resets_ttl: bool,
}

/// Per-entry expiry: each value carries its own TTL.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        if value.resets_ttl {
            value.ttl
        } else {
            duration_until_expiry
        }
    }
}

/// Bounded in-memory [`KvStore`].
///
/// Expired keys are invisible to `get` immediately, even before moka
/// evicts them. State is per process, so two instances behind a load
/// balancer each enforce their own quotas.
pub struct MemoryStore {
    entries: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store with the default capacity (100,000 keys).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).await.map(|v| v.data))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let value = StoredValue {
            data: value.to_owned(),
            ttl: Some(ttl),
            resets_ttl: true,
        };
        self.entries.insert(key.to_owned(), value).await;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut outcome = Ok(1);
        self.entries
            .entry(key.to_owned())
            .and_compute_with(|existing| {
                let op = match existing {
                    None => Op::Put(StoredValue {
                        data: "1".to_owned(),
                        ttl: None,
                        resets_ttl: false,
                    }),
                    Some(entry) => {
                        let current = entry.into_value();
                        match current.data.parse::<i64>() {
                            Ok(n) => {
                                outcome = Ok(n + 1);
                                Op::Put(StoredValue {
                                    data: (n + 1).to_string(),
                                    ttl: current.ttl,
                                    resets_ttl: false,
                                })
                            }
                            Err(_) => {
                                outcome = Err(PrecisError::Store(format!(
                                    "value at '{key}' is not an integer"
                                )));
                                Op::Nop
                            }
                        }
                    }
                };
                std::future::ready(op)
            })
            .await;
        outcome
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
