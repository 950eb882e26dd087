use crate::cache::StoreHealth;
use crate::config::Config;
use crate::state::open_store;

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;

    match store.health_check().await {
        StoreHealth::Up => {
            println!("✓ Cache store is reachable");
            Ok(())
        }
        StoreHealth::Down => {
            println!("✗ Cache store is not reachable");
            anyhow::bail!("cache store health check failed")
        }
    }
}
