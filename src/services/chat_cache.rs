use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::generator::{ResponseGenerator, with_citations};
use super::{CacheOutcome, Resolved};
use crate::cache::{CacheKey, Namespace, ResponseCache, derive_key, normalize_messages};
use crate::clients::SearchProvider;
use crate::models::{ChatReply, ChatResponse, Message, SaveAck, messages_from_hits, unix_timestamp};

/// One chat request as seen by the cache.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub query: String,

    /// Free-form caller context; not part of the key.
    pub context: String,

    /// Externally produced answer to persist instead of generating one.
    pub response: Option<String>,

    /// Loosely-typed messages accompanying `response`.
    pub messages: Option<Value>,
}

/// Cache-aside front for chat answers.
///
/// Never fails: store problems degrade to uncached answers and a failed
/// supporting search degrades to an answer without messages.
pub struct ChatCacheService {
    cache: ResponseCache,
    provider: Arc<dyn SearchProvider>,
    generator: Arc<dyn ResponseGenerator>,
    citation_limit: u32,
}

impl ChatCacheService {
    #[must_use]
    pub fn new(
        cache: ResponseCache,
        provider: Arc<dyn SearchProvider>,
        generator: Arc<dyn ResponseGenerator>,
        citation_limit: u32,
    ) -> Self {
        Self {
            cache,
            provider,
            generator,
            citation_limit,
        }
    }

    pub async fn chat(&self, input: ChatInput) -> Resolved<ChatReply> {
        let key = derive_key(Namespace::Chat, &input.query);

        if let Some(response) = self
            .cache
            .lookup::<ChatResponse>(&key, &input.context)
            .await
        {
            info!("Cache HIT for chat query: {}", input.query);
            return Resolved::new(ChatReply::Answer(response), CacheOutcome::HitReturned);
        }

        info!("Cache MISS for chat query: {}", input.query);

        match input.response.clone().filter(|r| !r.trim().is_empty()) {
            Some(text) => self.save(&key, input, text).await,
            None => self.generate(&key, input).await,
        }
    }

    async fn save(&self, key: &CacheKey, input: ChatInput, text: String) -> Resolved<ChatReply> {
        let response = ChatResponse {
            id: Uuid::new_v4().to_string(),
            query: input.query,
            response: text,
            from_cache: false,
            messages: normalize_messages(input.messages),
            context: input.context,
            timestamp: unix_timestamp(),
        };

        if self.cache.write(key, &response).await {
            info!("Saved chat response {} under '{}'", response.id, key);
            Resolved::new(
                ChatReply::Saved(SaveAck::success(response.id)),
                CacheOutcome::SavedAck,
            )
        } else {
            Resolved::new(
                ChatReply::Saved(SaveAck::not_stored(response.id)),
                CacheOutcome::MissResolvedStoreFailed,
            )
        }
    }

    async fn generate(&self, key: &CacheKey, input: ChatInput) -> Resolved<ChatReply> {
        let (mut messages, search_payload) = self.gather_messages(&input.query).await;

        let context = match search_payload {
            Some(payload) if !messages.is_empty() => Value::Object(payload).to_string(),
            _ => {
                messages = messages_from_context(&input.context);
                input.context.clone()
            }
        };

        let text = self
            .generator
            .generate(&input.query, &context, &messages)
            .await;

        let response = ChatResponse {
            id: Uuid::new_v4().to_string(),
            query: input.query,
            response: with_citations(text, &messages),
            from_cache: false,
            messages,
            context,
            timestamp: unix_timestamp(),
        };

        let outcome = CacheOutcome::from_write(self.cache.write(key, &response).await);
        Resolved::new(ChatReply::Answer(response), outcome)
    }

    async fn gather_messages(&self, query: &str) -> (Vec<Message>, Option<Map<String, Value>>) {
        match self.provider.search(query, self.citation_limit).await {
            Ok(payload) => {
                metrics::counter!("upstream_requests_total", "outcome" => "success").increment(1);
                let messages = payload
                    .get("results")
                    .and_then(Value::as_array)
                    .map(|hits| messages_from_hits(hits))
                    .unwrap_or_default();
                (messages, Some(payload))
            }
            Err(e) => {
                warn!(
                    "Supporting search for chat query '{}' failed, answering without messages: {}",
                    query, e
                );
                metrics::counter!("upstream_requests_total", "outcome" => "error").increment(1);
                (Vec::new(), None)
            }
        }
    }
}

/// Extracts messages from a caller context holding a SearxNG-shaped payload.
fn messages_from_context(context: &str) -> Vec<Message> {
    match serde_json::from_str::<Value>(context) {
        Ok(Value::Object(payload)) => payload
            .get("results")
            .and_then(Value::as_array)
            .map(|hits| messages_from_hits(hits))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
