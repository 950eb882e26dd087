pub mod searxng;

pub use searxng::{SearchProvider, SearxngClient, UpstreamError};
