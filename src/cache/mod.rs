//! Cache-aside building blocks: key derivation, the store capability and its
//! adapters, payload normalization, and the entry-level read/write protocol.

pub mod entry;
pub mod key;
pub mod memory;
pub mod normalize;
pub mod redis_store;
pub mod store;

pub use entry::ResponseCache;
pub use key::{CacheKey, Namespace, derive_key, normalize_query};
pub use memory::MemoryStore;
pub use normalize::{Canonical, CorruptEntry, canonical_message, normalize, normalize_messages};
pub use redis_store::RedisStore;
pub use store::{CacheStore, StoreError, StoreHealth};
