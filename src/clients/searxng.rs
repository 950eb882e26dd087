use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::SearxngConfig;

/// The search collaborator could not produce a result.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search engine returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected search payload: {0}")]
    Payload(String),
}

/// External search engine returning a raw results payload.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Map<String, Value>, UpstreamError>;
}

#[derive(Clone)]
pub struct SearxngClient {
    client: Client,
    base_url: String,
    engines: String,
}

impl SearxngClient {
    /// Uses `client` for connection pooling; its timeout bounds every search.
    #[must_use]
    pub fn with_shared_client(client: Client, config: &SearxngConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            engines: config.engines.clone(),
        }
    }

    fn search_url(&self, query: &str, limit: u32) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}/search", self.base_url))
            .map_err(|e| UpstreamError::Payload(format!("invalid search URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("engines", &self.engines)
            .append_pair("limit", &limit.to_string());

        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for SearxngClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Map<String, Value>, UpstreamError> {
        let url = self.search_url(query, limit)?;
        debug!("Querying SearxNG: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        match response.json::<Value>().await? {
            Value::Object(payload) => Ok(payload),
            _ => Err(UpstreamError::Payload(
                "expected a JSON object at the top level".to_string(),
            )),
        }
    }
}
