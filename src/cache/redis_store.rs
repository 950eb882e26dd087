use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{CacheKey, CacheStore, StoreError, StoreHealth};
use crate::config::RedisConfig;

/// Redis-backed store using `SET ... EX` for atomic write-with-expiry.
///
/// All requests share one `ConnectionManager`, which multiplexes commands
/// and reconnects on its own after I/O failures. It is created on first use
/// so the service can start while Redis is down. Every operation, the
/// first connect included, is bounded by the configured timeout.
pub struct RedisStore {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisStore {
    pub fn open(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url())
            .map_err(|e| StoreError::Unavailable(format!("Invalid Redis configuration: {e}")))?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            timeout: config.timeout(),
        })
    }

    async fn manager(&self) -> Result<ConnectionManager, StoreError> {
        if let Some(manager) = self.manager.get() {
            return Ok(manager.clone());
        }

        // Callers racing here each connect; the first manager stored is kept.
        let manager = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection error: {e}")))?;
        debug!("Opened Redis connection manager");

        let _ = self.manager.set(manager.clone());
        Ok(self.manager.get().cloned().unwrap_or(manager))
    }

    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(ConnectionManager) -> Fut + Send,
        Fut: Future<Output = RedisResult<T>> + Send,
        T: Send,
    {
        let attempt = async {
            let manager = self.manager().await?;
            f(manager)
                .await
                .map_err(|e| StoreError::Unavailable(format!("Redis {op} error: {e}")))
        };

        tokio::time::timeout(self.timeout, attempt)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.timeout)))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        let key = key.as_str().to_string();
        self.run("GET", |mut con| async move {
            let raw: Option<Vec<u8>> = con.get(key).await?;
            Ok(raw)
        })
        .await
    }

    async fn set_with_expiry(
        &self,
        key: &CacheKey,
        payload: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = key.as_str().to_string();
        let payload = payload.to_vec();
        let seconds = ttl.as_secs().max(1);
        self.run("SETEX", |mut con| async move {
            con.set_ex::<_, _, ()>(key, payload, seconds).await
        })
        .await
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), StoreError> {
        let key = key.as_str().to_string();
        self.run("DEL", |mut con| async move { con.del::<_, ()>(key).await })
            .await
    }

    async fn health_check(&self) -> StoreHealth {
        let pong = self
            .run("PING", |mut con| async move {
                redis::cmd("PING").query_async::<String>(&mut con).await
            })
            .await;

        match pong {
            Ok(_) => StoreHealth::Up,
            Err(e) => {
                debug!("Redis health check failed: {}", e);
                StoreHealth::Down
            }
        }
    }
}
