//! Response generation behind the chat cache.
//!
//! The cache logic only depends on [`ResponseGenerator`]; the simulated
//! backend can be swapped for a real model without touching it.

use async_trait::async_trait;
use std::time::Duration;

use crate::models::Message;

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Produces answer text for `query` from the supporting `messages`.
    async fn generate(&self, query: &str, context: &str, messages: &[Message]) -> String;
}

/// Stand-in backend that echoes the query.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGenerator {
    latency: Duration,
}

impl SimulatedGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Delays every answer by `latency` to mimic a real model round-trip.
    #[must_use]
    pub const fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl ResponseGenerator for SimulatedGenerator {
    async fn generate(&self, query: &str, _context: &str, _messages: &[Message]) -> String {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        format!("This is a simulated response to: {query}")
    }
}

/// Appends a numbered list of message titles to `text`.
#[must_use]
pub fn with_citations(text: String, messages: &[Message]) -> String {
    if messages.is_empty() {
        return text;
    }

    let citations = messages
        .iter()
        .enumerate()
        .map(|(i, m)| format!("[{}] {}", i + 1, m.metadata.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{text}\n\nSources:\n{citations}")
}
