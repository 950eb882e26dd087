pub mod chat_cache;
pub use chat_cache::{ChatCacheService, ChatInput};

pub mod generator;
pub use generator::{ResponseGenerator, SimulatedGenerator};

pub mod outcome;
pub use outcome::{CacheOutcome, Resolved};

pub mod search_cache;
pub use search_cache::{SearchCacheError, SearchCacheService};
