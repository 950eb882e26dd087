use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::validation::{clamp_limit, validate_search_query};
use super::{ApiError, AppState, SearchRequest};
use crate::models::SearchResult;
use crate::services::CacheOutcome;

/// `POST /api/search`
///
/// The body is the search result itself, with `fromCache` telling a
/// replayed answer from a fresh one.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<(Extension<CacheOutcome>, Json<SearchResult>), ApiError> {
    let query = validate_search_query(&request.query)?;
    let limit = clamp_limit(request.limit);

    let resolved = state.search_service().search(query, limit).await?;

    Ok((Extension(resolved.outcome), Json(resolved.value)))
}
