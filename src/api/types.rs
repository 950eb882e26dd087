use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::StoreHealth;
use crate::constants::limits::DEFAULT_SEARCH_LIMIT;

/// Error envelope; successful calls return the payload itself.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub error: String,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

const fn default_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub context: String,

    pub response: Option<String>,

    /// Kept loose so malformed client messages are repaired, not rejected.
    pub messages: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub redis: StoreHealth,
    pub timestamp: f64,
}
