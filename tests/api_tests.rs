use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use query_cache::cache::{
    CacheKey, CacheStore, MemoryStore, Namespace, StoreError, StoreHealth,
};
use query_cache::clients::{SearchProvider, UpstreamError};
use query_cache::config::{Config, StoreBackend};
use query_cache::services::SimulatedGenerator;
use query_cache::state::SharedState;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

struct StubProvider {
    calls: AtomicUsize,
    last_limit: AtomicU32,
    fail: bool,
}

impl StubProvider {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_limit: AtomicU32::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_limit: AtomicU32::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    async fn search(&self, query: &str, limit: u32) -> Result<Map<String, Value>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::Status(503));
        }
        let payload = json!({
            "query": query,
            "results": [
                {"title": "Redis", "url": "https://redis.io", "content": "Redis is an in-memory data store"}
            ]
        });
        match payload {
            Value::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }
}

struct DownStore;

#[async_trait]
impl CacheStore for DownStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_expiry(
        &self,
        _key: &CacheKey,
        _payload: &[u8],
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &CacheKey) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth::Down
    }
}

fn spawn_app(store: Arc<dyn CacheStore>, provider: Arc<StubProvider>) -> Router {
    let mut config = Config::default();
    config.redis.backend = StoreBackend::Memory;

    let shared = SharedState::with_collaborators(
        config,
        store,
        provider,
        Arc::new(SimulatedGenerator::new()),
    );
    let state = query_cache::api::create_app_state(Arc::new(shared), None);
    query_cache::api::router(state)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let app = spawn_app(Arc::new(MemoryStore::new()), StubProvider::ok());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["redis"], "UP");
    assert!(json["timestamp"].as_f64().unwrap() > 0.0);

    let app = spawn_app(Arc::new(DownStore), StubProvider::ok());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["redis"], "DOWN");
}

#[tokio::test]
async fn test_search_is_cached_across_query_variants() {
    let provider = StubProvider::ok();
    let app = spawn_app(Arc::new(MemoryStore::new()), provider.clone());

    let (status, first) = post_json(&app, "/api/search", json!({"query": "Redis"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fromCache"], false);
    assert_eq!(first["messages"][0]["metadata"]["title"], "Redis");

    let (status, second) = post_json(&app, "/api/search", json!({"query": "  redis "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fromCache"], true);
    assert_eq!(second["messages"], first["messages"]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_search_upstream_failure_is_500_and_not_cached() {
    let store = Arc::new(MemoryStore::new());
    let app = spawn_app(store.clone(), StubProvider::failing());

    let (status, body) = post_json(&app, "/api/search", json!({"query": "Redis"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    let stored = store
        .get(&CacheKey::derive(Namespace::Search, "redis"))
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_search_works_without_store() {
    let provider = StubProvider::ok();
    let app = spawn_app(Arc::new(DownStore), provider.clone());

    for _ in 0..2 {
        let (status, body) = post_json(&app, "/api/search", json!({"query": "Redis"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fromCache"], false);
    }
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_blank_search_query_is_rejected() {
    let app = spawn_app(Arc::new(MemoryStore::new()), StubProvider::ok());

    let (status, body) = post_json(&app, "/api/search", json!({"query": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query cannot be empty");
}

#[tokio::test]
async fn test_out_of_range_limit_is_clamped() {
    let provider = StubProvider::ok();
    let app = spawn_app(Arc::new(MemoryStore::new()), provider.clone());

    let (status, _) = post_json(&app, "/api/search", json!({"query": "x", "limit": 500})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.last_limit.load(Ordering::SeqCst), 100);

    let (status, _) = post_json(&app, "/api/search", json!({"query": "y", "limit": 0})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.last_limit.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_chat_query_is_answered() {
    let store = Arc::new(MemoryStore::new());
    let app = spawn_app(store.clone(), StubProvider::ok());

    let (status, body) = post_json(&app, "/api/chat", json!({"query": "   "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], false);
    assert!(body["response"].is_string());

    let stored = store
        .get(&CacheKey::derive(Namespace::Chat, ""))
        .await
        .unwrap();
    assert!(stored.is_some());

    let (status, body) = post_json(&app, "/api/chat", json!({"query": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], true);
}

#[tokio::test]
async fn test_chat_save_then_read_back() {
    let provider = StubProvider::ok();
    let app = spawn_app(Arc::new(MemoryStore::new()), provider.clone());

    let (status, ack) = post_json(
        &app,
        "/api/chat",
        json!({
            "query": "What is Redis?",
            "context": "databases",
            "response": "R",
            "messages": [{"pageContent": "Redis is an in-memory data store"}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "success");
    assert!(ack["id"].is_string());

    let (status, answer) = post_json(&app, "/api/chat", json!({"query": "what is redis?"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["fromCache"], true);
    assert_eq!(answer["response"], "R");
    assert_eq!(answer["id"], ack["id"]);
    assert_eq!(answer["context"], "databases");
    assert_eq!(
        answer["messages"][0]["metadata"]["title"],
        "Redis is an in-memory data store"
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_chat_generates_and_caches() {
    let provider = StubProvider::ok();
    let app = spawn_app(Arc::new(MemoryStore::new()), provider.clone());

    let (status, first) = post_json(&app, "/api/chat", json!({"query": "Redis"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fromCache"], false);
    assert!(first["response"].as_str().unwrap().contains("Redis"));
    assert_eq!(first["messages"].as_array().unwrap().len(), 1);

    let (_, second) = post_json(&app, "/api/chat", json!({"query": "REDIS"})).await;
    assert_eq!(second["fromCache"], true);
    assert_eq!(second["response"], first["response"]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_chat_upgrades_legacy_sources_entry() {
    let store = Arc::new(MemoryStore::new());
    let legacy = json!({
        "id": "legacy-1",
        "query": "q",
        "response": "R",
        "sources": [{"pageContent": "Redis is an in-memory data store"}]
    });
    store
        .set_with_expiry(
            &CacheKey::derive(Namespace::Chat, "q"),
            legacy.to_string().as_bytes(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let app = spawn_app(store, StubProvider::ok());
    let (status, answer) = post_json(&app, "/api/chat", json!({"query": "q"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["fromCache"], true);
    assert!(answer.get("sources").is_none());
    assert_eq!(
        answer["messages"][0]["metadata"]["snippet"],
        "Redis is an in-memory data store"
    );
    assert_eq!(answer["context"], "");
}

#[tokio::test]
async fn test_corrupt_entry_is_a_clean_miss() {
    let store = Arc::new(MemoryStore::new());
    let key = CacheKey::derive(Namespace::Search, "redis");
    store
        .set_with_expiry(&key, b"{not json", Duration::from_secs(60))
        .await
        .unwrap();

    let provider = StubProvider::ok();
    let app = spawn_app(store.clone(), provider.clone());

    let (status, body) = post_json(&app, "/api/search", json!({"query": "Redis"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], false);
    assert_eq!(provider.calls(), 1);

    // The corrupt entry was replaced by the fresh result.
    let (_, body) = post_json(&app, "/api/search", json!({"query": "Redis"})).await;
    assert_eq!(body["fromCache"], true);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_cache_outcome_header() {
    let app = spawn_app(Arc::new(MemoryStore::new()), StubProvider::ok());

    let outcome = |app: Router, uri: &'static str, body: Value| async move {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get("x-cache-outcome")
            .map(|v| v.to_str().unwrap().to_string())
    };

    let search = json!({"query": "Redis"});
    assert_eq!(
        outcome(app.clone(), "/api/search", search.clone()).await.as_deref(),
        Some("miss_resolved_and_stored")
    );
    assert_eq!(
        outcome(app.clone(), "/api/search", search).await.as_deref(),
        Some("hit_returned")
    );
    assert_eq!(
        outcome(
            app.clone(),
            "/api/chat",
            json!({"query": "q", "response": "R"})
        )
        .await
        .as_deref(),
        Some("saved_ack")
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().get("x-cache-outcome").is_none());
}
