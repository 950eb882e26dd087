use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Message;

/// Canonical chat payload, both as returned to clients and as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub id: String,

    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub response: String,

    #[serde(rename = "fromCache", default)]
    pub from_cache: bool,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub context: String,

    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: f64,
}

/// Canonical search payload.
///
/// Upstream fields this crate does not interpret (`number_of_results`,
/// `suggestions`, `infoboxes`, ...) are carried through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub results: Vec<Value>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(rename = "fromCache", default)]
    pub from_cache: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Returned by the chat save path instead of the response itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveAck {
    pub status: String,

    pub message: String,

    pub id: String,
}

impl SaveAck {
    #[must_use]
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: "Response saved to cache".to_string(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn not_stored(id: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: "Response could not be written to the cache".to_string(),
            id: id.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Outcome of a chat request: either a displayable response or a save receipt.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChatReply {
    Answer(ChatResponse),
    Saved(SaveAck),
}

#[must_use]
pub fn unix_timestamp() -> f64 {
    let now = chrono::Utc::now();
    #[allow(clippy::cast_precision_loss)]
    let millis = now.timestamp_millis() as f64;
    millis / 1000.0
}
