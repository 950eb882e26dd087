use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::SearchCacheError;

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    UpstreamUnavailable { service: String, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::UpstreamUnavailable { service, message } => {
                write!(f, "{service} error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::UpstreamUnavailable { service, message } => {
                tracing::warn!("{} upstream error: {}", service, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error fetching {service} results"),
                )
            }
        };

        let body = ApiResponse::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<SearchCacheError> for ApiError {
    fn from(err: SearchCacheError) -> Self {
        match err {
            SearchCacheError::UpstreamUnavailable(e) => Self::search_error(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn search_error(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service: "search".to_string(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
