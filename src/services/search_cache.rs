use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::{CacheOutcome, Resolved};
use crate::cache::{Namespace, ResponseCache, derive_key, normalize};
use crate::clients::{SearchProvider, UpstreamError};
use crate::models::SearchResult;

#[derive(Debug, Error)]
pub enum SearchCacheError {
    #[error("Search upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),
}

/// Cache-aside front for the search collaborator.
pub struct SearchCacheService {
    cache: ResponseCache,
    provider: Arc<dyn SearchProvider>,
}

impl SearchCacheService {
    #[must_use]
    pub fn new(cache: ResponseCache, provider: Arc<dyn SearchProvider>) -> Self {
        Self { cache, provider }
    }

    /// Returns the cached result for `query`, or fetches and caches a fresh one.
    ///
    /// `limit` is forwarded upstream on a miss but is not part of the key.
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Resolved<SearchResult>, SearchCacheError> {
        let key = derive_key(Namespace::Search, query);

        if let Some(result) = self.cache.lookup::<SearchResult>(&key, "").await {
            info!("Cache HIT for search query: {}", query);
            return Ok(Resolved::new(result, CacheOutcome::HitReturned));
        }

        info!("Cache MISS for search query: {}", query);

        let payload = match self.provider.search(query, limit).await {
            Ok(payload) => {
                metrics::counter!("upstream_requests_total", "outcome" => "success").increment(1);
                payload
            }
            Err(e) => {
                error!("Error fetching search results for '{}': {}", query, e);
                metrics::counter!("upstream_requests_total", "outcome" => "error").increment(1);
                return Err(e.into());
            }
        };

        let result = canonical_search(query, payload)?;
        let outcome = CacheOutcome::from_write(self.cache.write(&key, &result).await);

        Ok(Resolved::new(result, outcome))
    }
}

/// Shapes a fresh upstream payload into a canonical, not-cached result.
fn canonical_search(
    query: &str,
    payload: Map<String, Value>,
) -> Result<SearchResult, UpstreamError> {
    let mut result: SearchResult =
        normalize(payload, "").map_err(|e| UpstreamError::Payload(e.to_string()))?;

    if result.query.is_empty() {
        result.query = query.to_string();
    }
    result.from_cache = false;

    Ok(result)
}
