//! Capability interface over the key-value store.
//!
//! Nothing outside the adapters talks to the store directly; services only
//! see [`CacheStore`].

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use super::CacheKey;

/// The store could not serve the request.
///
/// Callers treat every variant the same way: a read becomes a miss, a write
/// is logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreHealth {
    Up,
    Down,
}

impl StoreHealth {
    #[must_use]
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `payload` and its expiry atomically.
    async fn set_with_expiry(
        &self,
        key: &CacheKey,
        payload: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn delete(&self, key: &CacheKey) -> Result<(), StoreError>;

    async fn health_check(&self) -> StoreHealth;
}
