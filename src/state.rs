use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{CacheStore, MemoryStore, RedisStore, ResponseCache};
use crate::clients::{SearchProvider, SearxngClient};
use crate::config::{Config, StoreBackend};
use crate::services::{
    ChatCacheService, ResponseGenerator, SearchCacheService, SimulatedGenerator,
};

/// Build a shared HTTP client with reasonable defaults for upstream calls.
/// The client timeout is what bounds every search request.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("query-cache/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Opens the configured store backend.
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    match config.redis.backend {
        StoreBackend::Redis => {
            info!(
                "Using Redis store at {}:{} (db {})",
                config.redis.host, config.redis.port, config.redis.db
            );
            let store = RedisStore::open(&config.redis)?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub cache: ResponseCache,

    pub search_service: Arc<SearchCacheService>,

    pub chat_service: Arc<ChatCacheService>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = open_store(&config)?;

        let http_client = build_shared_http_client(config.searxng.request_timeout_seconds)?;
        let provider = Arc::new(SearxngClient::with_shared_client(
            http_client,
            &config.searxng,
        ));

        let generator = Arc::new(SimulatedGenerator::with_latency(Duration::from_millis(
            config.chat.simulated_latency_ms,
        )));

        Ok(Self::with_collaborators(config, store, provider, generator))
    }

    /// Wires the services around explicitly supplied collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn SearchProvider>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        let cache = ResponseCache::new(store, config.cache.ttl());

        let search_service = Arc::new(SearchCacheService::new(cache.clone(), provider.clone()));

        let chat_service = Arc::new(ChatCacheService::new(
            cache.clone(),
            provider,
            generator,
            config.chat.citation_limit,
        ));

        Self {
            config: Arc::new(config),
            cache,
            search_service,
            chat_service,
        }
    }
}
