//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use vsixproxy_core::VsixError;
use vsixproxy_types::ErrorBody;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] VsixError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Status code and stable error code for this failure
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Core(e) => match e {
                VsixError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_identifier"),
                VsixError::EmptyVersionList(_) => (StatusCode::NOT_FOUND, "no_versions"),
                VsixError::UpstreamStatus { status: 404, .. } => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                VsixError::Network(_) | VsixError::UpstreamStatus { .. } => {
                    (StatusCode::BAD_GATEWAY, "upstream_unavailable")
                }
                VsixError::Parse(_) => (StatusCode::BAD_GATEWAY, "metadata_unreadable"),
                VsixError::Template(_) | VsixError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request failed: {}", self);
        }

        let body = ErrorBody {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
