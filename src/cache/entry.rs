use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::normalize::{Canonical, normalize_entry};
use super::{CacheKey, CacheStore, StoreError, StoreHealth};

/// Read-through/write-through access to the store for canonical responses.
///
/// Store failures never escape from here: a failed read is reported as a
/// miss, a corrupt entry is deleted and reported as a miss, and a failed
/// write is logged and reported as `false`.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Returns the stored value for `key`, normalized and flagged as cached.
    pub async fn lookup<T: Canonical>(&self, key: &CacheKey, fallback_context: &str) -> Option<T> {
        let namespace = key.namespace().as_str();

        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                metrics::counter!("cache_lookups_total", "namespace" => namespace, "outcome" => "miss")
                    .increment(1);
                return None;
            }
            Err(e) => {
                warn!("Cache read for '{}' failed, treating as miss: {}", key, e);
                metrics::counter!("cache_lookups_total", "namespace" => namespace, "outcome" => "store_error")
                    .increment(1);
                return None;
            }
        };

        match normalize_entry::<T>(&bytes, fallback_context) {
            Ok(mut value) => {
                value.set_from_cache(true);
                metrics::counter!("cache_lookups_total", "namespace" => namespace, "outcome" => "hit")
                    .increment(1);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding '{}': {}", key, e);
                metrics::counter!("cache_lookups_total", "namespace" => namespace, "outcome" => "corrupt")
                    .increment(1);
                if let Err(e) = self.store.delete(key).await {
                    warn!("Failed to delete corrupt entry '{}': {}", key, e);
                }
                None
            }
        }
    }

    /// Stores `value` under `key` with the configured TTL.
    ///
    /// Returns whether the write reached the store.
    pub async fn write<T: Serialize + Sync>(&self, key: &CacheKey, value: &T) -> bool {
        let namespace = key.namespace().as_str();

        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize entry for '{}': {}", key, e);
                metrics::counter!("cache_writes_total", "namespace" => namespace, "outcome" => "failed")
                    .increment(1);
                return false;
            }
        };

        match self.store.set_with_expiry(key, &payload, self.ttl).await {
            Ok(()) => {
                debug!("Cached '{}' for {:?}", key, self.ttl);
                metrics::counter!("cache_writes_total", "namespace" => namespace, "outcome" => "stored")
                    .increment(1);
                true
            }
            Err(e) => {
                warn!("Cache write for '{}' failed, continuing: {}", key, e);
                metrics::counter!("cache_writes_total", "namespace" => namespace, "outcome" => "failed")
                    .increment(1);
                false
            }
        }
    }

    pub async fn evict(&self, key: &CacheKey) -> Result<(), StoreError> {
        self.store.delete(key).await?;
        info!("Evicted '{}'", key);
        Ok(())
    }

    pub async fn health(&self) -> StoreHealth {
        self.store.health_check().await
    }
}
