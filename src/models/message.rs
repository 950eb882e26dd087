use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::messages::{MISSING_CONTENT, SNIPPET_MAX_CHARS, TITLE_MAX_CHARS};

/// One retrieved or cited item attached to a search or chat response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "pageContent")]
    pub page_content: String,

    pub metadata: MessageMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageMetadata {
    pub title: String,

    pub url: String,

    pub snippet: String,
}

impl MessageMetadata {
    /// Metadata synthesized from page content when none was supplied.
    #[must_use]
    pub fn derived_from(page_content: &str) -> Self {
        Self {
            title: derive_title(page_content),
            url: String::new(),
            snippet: derive_snippet(page_content),
        }
    }
}

impl Message {
    #[must_use]
    pub fn from_content(page_content: impl Into<String>) -> Self {
        let page_content = page_content.into();
        let metadata = MessageMetadata::derived_from(&page_content);
        Self {
            page_content,
            metadata,
        }
    }

    /// Projects one SearxNG result (`title`, `url`, `content`) into a message.
    ///
    /// Returns `None` for results that are not objects.
    #[must_use]
    pub fn from_search_hit(hit: &Value) -> Option<Self> {
        let hit = hit.as_object()?;
        let text = |key: &str| {
            hit.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let content = text("content").unwrap_or(MISSING_CONTENT);
        let title = text("title").map_or_else(|| derive_title(content), ToString::to_string);

        Some(Self {
            page_content: content.to_string(),
            metadata: MessageMetadata {
                title,
                url: text("url").unwrap_or_default().to_string(),
                snippet: derive_snippet(content),
            },
        })
    }
}

/// Projects a SearxNG `results` list into messages, skipping non-objects.
#[must_use]
pub fn messages_from_hits(hits: &[Value]) -> Vec<Message> {
    hits.iter().filter_map(Message::from_search_hit).collect()
}

#[must_use]
pub fn derive_title(page_content: &str) -> String {
    truncate_chars(page_content.trim(), TITLE_MAX_CHARS)
}

#[must_use]
pub fn derive_snippet(page_content: &str) -> String {
    truncate_chars(page_content.trim(), SNIPPET_MAX_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
