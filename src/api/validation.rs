use super::ApiError;
use crate::constants::limits::MAX_SEARCH_LIMIT;

/// Brings an out-of-range `limit` back into `1..=MAX_SEARCH_LIMIT`.
///
/// The limit is only forwarded upstream, so a bad value is corrected
/// rather than rejected.
#[must_use]
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_SEARCH_LIMIT)
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Query cannot be empty"));
    }
    Ok(trimmed)
}
