//! Redis-backed store shared by every instance of the service.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::KvStore;
use crate::{PrecisError, Result};

/// Default per-operation timeout.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// [`KvStore`] over a Redis server.
///
/// The connection is opened lazily on first use. If Redis is down at
/// that point the operation fails and the next one tries again; once
/// established, the connection manager reconnects on its own. Every
/// operation is bounded by a short timeout so a hung server cannot
/// stall the pipeline.
pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Create a store for the given URL (e.g. `redis://redis:6379/0`).
    ///
    /// Only parses the URL; no connection is made until first use.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| PrecisError::Configuration(format!("invalid Redis URL: {e}")))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Set the per-operation timeout (default 2s).
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .inspect_err(|e| warn!(error = %e, "Redis connection failed"))?;
                info!("Redis connection established");
                Ok::<_, PrecisError>(manager)
            });
        let conn = self.bounded("connect", conn).await?;
        Ok(conn.clone())
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| {
                PrecisError::Store(format!(
                    "Redis {operation} timed out after {:?}",
                    self.op_timeout
                ))
            })?
    }
}

#[async_trait]
impl KvStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded("GET", async move {
            let value: Option<String> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let millis = ttl.as_millis().max(1) as u64;
        self.bounded("PSETEX", async move {
            let _: () = conn.pset_ex(key, value, millis).await?;
            Ok(())
        })
        .await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        self.bounded("INCR", async move {
            let value: i64 = conn.incr(key, 1).await?;
            Ok(value)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        self.bounded("PING", async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}
