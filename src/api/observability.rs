use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::services::CacheOutcome;

pub const CACHE_OUTCOME_HEADER: &str = "x-cache-outcome";

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Wraps each request in a span and records how the cache served it.
///
/// Handlers of cached endpoints attach their [`CacheOutcome`] as a response
/// extension; it is surfaced as the `x-cache-outcome` header, as the `cache`
/// metric label and in the completion log line.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    async move {
        let mut response = next.run(req).await;

        let status = response.status().as_u16();
        let cache = response
            .extensions()
            .get::<CacheOutcome>()
            .map_or("none", |outcome| outcome.as_str());

        if cache != "none" {
            response
                .headers_mut()
                .insert(CACHE_OUTCOME_HEADER, HeaderValue::from_static(cache));
        }

        let labels = [
            ("method", method),
            ("path", route),
            ("status", status.to_string()),
            ("cache", cache.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            status_code = status,
            cache = cache,
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}
