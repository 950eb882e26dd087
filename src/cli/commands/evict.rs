use crate::cache::{Namespace, ResponseCache, derive_key};
use crate::config::Config;
use crate::state::open_store;

pub async fn cmd_evict(config: &Config, namespace: &str, query: &str) -> anyhow::Result<()> {
    let namespace: Namespace = namespace.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let cache = ResponseCache::new(open_store(config)?, config.cache.ttl());
    let key = derive_key(namespace, query);

    cache
        .evict(&key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to evict {key}: {e}"))?;

    println!("✓ Evicted {key}");
    Ok(())
}
