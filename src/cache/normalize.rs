//! Reconciles stored and freshly built payloads into the canonical schema.
//!
//! Entries carry no version header, so every historical shape has to be
//! repaired here at read time. Each step checks whether its field is already
//! canonical before touching it, which keeps the whole pass idempotent.
//!
//! Repairs run on the loosely-typed decoded map; only the final step turns
//! it into a typed response.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::messages::MISSING_CONTENT;
use crate::models::message::{derive_snippet, derive_title};
use crate::models::{
    ChatResponse, Message, MessageMetadata, SearchResult, messages_from_hits, unix_timestamp,
};

const LEGACY_MESSAGES_FIELD: &str = "sources";

/// A stored entry could not be decoded into any known shape.
#[derive(Debug, Error)]
#[error("Corrupt cache entry: {0}")]
pub struct CorruptEntry(pub String);

/// A response shape the normalizer knows how to repair.
pub trait Canonical: DeserializeOwned {
    /// Brings `raw` into canonical shape in place.
    fn repair(raw: &mut Map<String, Value>, fallback_context: &str);

    fn set_from_cache(&mut self, from_cache: bool);
}

impl Canonical for ChatResponse {
    fn repair(raw: &mut Map<String, Value>, fallback_context: &str) {
        ensure_id(raw);
        migrate_legacy_messages(raw);
        ensure_messages(raw);
        ensure_context(raw, fallback_context);
        ensure_string(raw, "query");
        ensure_string(raw, "response");
        ensure_from_cache(raw);
        ensure_timestamp(raw);
    }

    fn set_from_cache(&mut self, from_cache: bool) {
        self.from_cache = from_cache;
    }
}

impl Canonical for SearchResult {
    fn repair(raw: &mut Map<String, Value>, _fallback_context: &str) {
        migrate_legacy_messages(raw);
        ensure_messages(raw);
        ensure_string(raw, "query");
        if !matches!(raw.get("results"), Some(Value::Array(_))) {
            raw.insert("results".to_string(), Value::Array(Vec::new()));
        }
        messages_from_results(raw);
        ensure_from_cache(raw);
    }

    fn set_from_cache(&mut self, from_cache: bool) {
        self.from_cache = from_cache;
    }
}

/// Parses stored bytes into a JSON object.
pub fn decode_entry(bytes: &[u8]) -> Result<Map<String, Value>, CorruptEntry> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CorruptEntry(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(CorruptEntry(e.to_string())),
    }
}

/// Repairs `raw` and converts it into the typed canonical response.
pub fn normalize<T: Canonical>(
    mut raw: Map<String, Value>,
    fallback_context: &str,
) -> Result<T, CorruptEntry> {
    T::repair(&mut raw, fallback_context);
    serde_json::from_value(Value::Object(raw))
        .map_err(|e| CorruptEntry(format!("payload does not fit the canonical shape: {e}")))
}

/// Decodes and normalizes a stored entry in one step.
pub fn normalize_entry<T: Canonical>(
    bytes: &[u8],
    fallback_context: &str,
) -> Result<T, CorruptEntry> {
    normalize(decode_entry(bytes)?, fallback_context)
}

/// Repairs a client- or store-supplied list of messages.
///
/// Anything that is not a list yields no messages.
#[must_use]
pub fn normalize_messages(raw: Option<Value>) -> Vec<Message> {
    match raw {
        Some(Value::Array(items)) => items.into_iter().map(canonical_message).collect(),
        _ => Vec::new(),
    }
}

/// Backfills `pageContent` and synthesizes any missing or malformed metadata.
#[must_use]
pub fn canonical_message(raw: Value) -> Message {
    let mut fields = match raw {
        Value::Object(map) => map,
        Value::String(text) => {
            let mut map = Map::new();
            map.insert("pageContent".to_string(), Value::String(text));
            map
        }
        _ => Map::new(),
    };

    let page_content = match fields.remove("pageContent") {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
        _ => MISSING_CONTENT.to_string(),
    };

    let metadata = match fields.remove("metadata") {
        Some(Value::Object(meta)) => MessageMetadata {
            title: non_empty_string(&meta, "title").unwrap_or_else(|| derive_title(&page_content)),
            url: non_empty_string(&meta, "url").unwrap_or_default(),
            snippet: non_empty_string(&meta, "snippet")
                .unwrap_or_else(|| derive_snippet(&page_content)),
        },
        _ => MessageMetadata::derived_from(&page_content),
    };

    Message {
        page_content,
        metadata,
    }
}

fn message_value(message: Message) -> Value {
    json!({
        "pageContent": message.page_content,
        "metadata": {
            "title": message.metadata.title,
            "url": message.metadata.url,
            "snippet": message.metadata.snippet,
        }
    })
}

fn ensure_id(raw: &mut Map<String, Value>) {
    let id = match raw.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => return,
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    raw.insert("id".to_string(), Value::String(id));
}

/// Adopts the legacy list when the modern one is absent; the legacy key
/// never survives.
fn migrate_legacy_messages(raw: &mut Map<String, Value>) {
    let Some(legacy) = raw.remove(LEGACY_MESSAGES_FIELD) else {
        return;
    };

    if matches!(raw.get("messages"), None | Some(Value::Null)) {
        raw.insert("messages".to_string(), legacy);
    }
}

fn ensure_messages(raw: &mut Map<String, Value>) {
    let messages = normalize_messages(raw.remove("messages"));
    raw.insert(
        "messages".to_string(),
        Value::Array(messages.into_iter().map(message_value).collect()),
    );
}

/// Raw SearxNG payloads carry hits in `results` only; project them into
/// `messages` when no messages survived migration.
fn messages_from_results(raw: &mut Map<String, Value>) {
    if !matches!(raw.get("messages"), Some(Value::Array(messages)) if messages.is_empty()) {
        return;
    }
    let messages = match raw.get("results") {
        Some(Value::Array(hits)) => messages_from_hits(hits),
        _ => return,
    };
    raw.insert(
        "messages".to_string(),
        Value::Array(messages.into_iter().map(message_value).collect()),
    );
}

fn ensure_context(raw: &mut Map<String, Value>, fallback_context: &str) {
    let context = match raw.get("context") {
        Some(Value::String(_)) => return,
        None | Some(Value::Null) => fallback_context.to_string(),
        Some(other) => other.to_string(),
    };
    raw.insert("context".to_string(), Value::String(context));
}

fn ensure_string(raw: &mut Map<String, Value>, key: &str) {
    let value = match raw.get(key) {
        Some(Value::String(_)) => return,
        Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
        _ => String::new(),
    };
    raw.insert(key.to_string(), Value::String(value));
}

fn ensure_from_cache(raw: &mut Map<String, Value>) {
    if !matches!(raw.get("fromCache"), Some(Value::Bool(_))) {
        raw.insert("fromCache".to_string(), Value::Bool(false));
    }
}

fn ensure_timestamp(raw: &mut Map<String, Value>) {
    if !matches!(raw.get("timestamp"), Some(Value::Number(_))) {
        raw.insert("timestamp".to_string(), json!(unix_timestamp()));
    }
}

fn non_empty_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn chat(value: Value) -> ChatResponse {
        normalize(object(value), "fallback").unwrap()
    }

    fn renormalize_chat(response: &ChatResponse) -> ChatResponse {
        let value = serde_json::to_value(response).unwrap();
        normalize(object(value), "other fallback").unwrap()
    }

    #[test]
    fn test_legacy_sources_become_messages() {
        let response = chat(json!({
            "id": "abc",
            "response": "cached answer",
            "sources": [
                { "pageContent": "Redis keeps data in memory" }
            ]
        }));

        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].page_content, "Redis keeps data in memory");
        assert_eq!(response.messages[0].metadata.title, "Redis keeps data in memory");

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("sources").is_none());
    }

    #[test]
    fn test_modern_messages_win_over_legacy_sources() {
        let response = chat(json!({
            "messages": [{ "pageContent": "modern" }],
            "sources": [{ "pageContent": "legacy" }, { "pageContent": "legacy 2" }]
        }));

        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].page_content, "modern");
    }

    #[test]
    fn test_missing_identity_and_context_are_backfilled() {
        let response = chat(json!({ "response": "hi" }));

        assert!(Uuid::parse_str(&response.id).is_ok());
        assert_eq!(response.context, "fallback");
        assert!(response.messages.is_empty());
        assert!(!response.from_cache);
        assert!(response.timestamp > 0.0);
    }

    #[test]
    fn test_existing_context_is_kept() {
        let response = chat(json!({ "id": "x", "context": "" }));
        assert_eq!(response.context, "");

        let response = chat(json!({ "id": "x", "context": { "results": [] } }));
        assert_eq!(response.context, r#"{"results":[]}"#);
    }

    #[test]
    fn test_non_list_messages_default_to_empty() {
        let response = chat(json!({ "messages": { "pageContent": "not a list" } }));
        assert!(response.messages.is_empty());

        let response = chat(json!({ "messages": null, "sources": "also not a list" }));
        assert!(response.messages.is_empty());
    }

    #[test]
    fn test_message_shapes_are_repaired() {
        let response = chat(json!({
            "messages": [
                "plain text source",
                { "pageContent": "" },
                { "pageContent": "with bad metadata", "metadata": "oops" },
                {
                    "pageContent": "partial metadata",
                    "metadata": { "url": "https://example.com", "title": 42 }
                },
                7
            ]
        }));

        let messages = &response.messages;
        assert_eq!(messages.len(), 5);

        assert_eq!(messages[0].page_content, "plain text source");
        assert_eq!(messages[0].metadata.title, "plain text source");

        assert_eq!(messages[1].page_content, MISSING_CONTENT);
        assert_eq!(messages[1].metadata.snippet, MISSING_CONTENT);

        assert_eq!(messages[2].metadata.title, "with bad metadata");
        assert!(messages[2].metadata.url.is_empty());

        assert_eq!(messages[3].metadata.url, "https://example.com");
        assert_eq!(messages[3].metadata.title, "partial metadata");
        assert_eq!(messages[3].metadata.snippet, "partial metadata");

        assert_eq!(messages[4].page_content, MISSING_CONTENT);
    }

    #[test]
    fn test_complete_metadata_is_untouched() {
        let message = canonical_message(json!({
            "pageContent": "Python performance guide",
            "metadata": {
                "title": "Python optimisation best practices",
                "url": "https://example.com/python-optimization",
                "snippet": "Several techniques..."
            }
        }));

        assert_eq!(message.metadata.title, "Python optimisation best practices");
        assert_eq!(message.metadata.snippet, "Several techniques...");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            json!({}),
            json!({ "id": 17, "response": 3, "fromCache": "yes", "timestamp": "today" }),
            json!({ "sources": [{ "pageContent": "x".repeat(500) }], "context": null }),
            json!({ "messages": ["a", null, { "metadata": { "title": "" } }], "context": [1, 2] }),
            json!({
                "id": "0b5f4c1e",
                "query": "q",
                "response": "r",
                "fromCache": true,
                "messages": [{
                    "pageContent": "c",
                    "metadata": { "title": "t", "url": "u", "snippet": "s" }
                }],
                "context": "ctx",
                "timestamp": 1_700_000_000.25
            }),
        ];

        for input in inputs {
            let once = chat(input);
            let twice = renormalize_chat(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_search_payload_repair() {
        let result: SearchResult = normalize(
            object(json!({
                "query": "redis",
                "results": [{ "title": "t", "url": "u", "content": "c" }],
                "number_of_results": 1,
                "sources": [{ "pageContent": "legacy" }]
            })),
            "",
        )
        .unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].page_content, "legacy");
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.extra.get("number_of_results"), Some(&json!(1)));
        assert!(!result.extra.contains_key("sources"));

        let again: SearchResult =
            normalize(object(serde_json::to_value(&result).unwrap()), "").unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_raw_searxng_payload_gains_messages() {
        let result: SearchResult = normalize(
            object(json!({
                "query": "redis",
                "results": [{ "title": "T", "url": "U", "content": "C" }]
            })),
            "",
        )
        .unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].page_content, "C");
        assert_eq!(result.messages[0].metadata.title, "T");
        assert_eq!(result.messages[0].metadata.url, "U");
        assert_eq!(result.messages[0].metadata.snippet, "C");

        let again: SearchResult =
            normalize(object(serde_json::to_value(&result).unwrap()), "").unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_search_payload_with_malformed_results() {
        let result: SearchResult =
            normalize(object(json!({ "results": "none", "query": null })), "").unwrap();
        assert!(result.results.is_empty());
        assert_eq!(result.query, "");
    }

    #[test]
    fn test_decode_entry_rejects_garbage() {
        assert!(decode_entry(b"{not json").is_err());
        assert!(decode_entry(&[0xff, 0xfe, 0x00]).is_err());
        assert!(decode_entry(b"[1, 2, 3]").is_err());
        assert!(decode_entry(b"\"string\"").is_err());
        assert!(decode_entry(br#"{"id": "ok"}"#).is_ok());
    }

    #[test]
    fn test_normalize_entry_round_trip() {
        let original = ChatResponse {
            id: "id-1".to_string(),
            query: "q".to_string(),
            response: "r".to_string(),
            from_cache: false,
            messages: vec![Message::from_content("c")],
            context: String::new(),
            timestamp: unix_timestamp(),
        };

        let bytes = serde_json::to_vec(&original).unwrap();
        let mut restored: ChatResponse = normalize_entry(&bytes, "ignored").unwrap();
        assert!(!restored.from_cache);
        restored.set_from_cache(true);

        assert_eq!(
            restored,
            ChatResponse {
                from_cache: true,
                ..original
            }
        );
    }
}
