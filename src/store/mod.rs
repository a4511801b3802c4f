//! Shared key-value store backends.
//!
//! The summary cache and the rate limiter keep their state in a store that
//! many requests read and mutate concurrently. The store's own atomicity
//! (set-with-expiry, atomic increment) is all they rely on; nothing above
//! this layer takes locks.
//!
//! Two backends:
//!
//! - [`MemoryStore`]: in-process, moka-backed. Good for a single instance
//!   and for tests.
//! - [`RedisStore`]: shared across instances (feature `redis`).
//!
//! Callers treat every error from a store as "store unavailable" and
//! degrade, so backends report failures plainly and never retry.

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Minimal key-value contract with per-key expiry.
///
/// Semantics follow Redis `GET` / `PSETEX` / `INCR` / `PING`.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Read a value. `Ok(None)` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value that expires after `ttl`, replacing any previous value
    /// and expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Atomically increment an integer value and return the new value.
    ///
    /// The key's remaining expiry is preserved. A missing key is created
    /// with value 1 and no expiry.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;
}
