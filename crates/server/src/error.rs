//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use stash_cache::CacheError;
use stash_kv::KvError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("backend error: {0}")]
    Kv(#[from] KvError),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::Io(_) => "internal_error",
            Self::Cache(e) => match e {
                CacheError::NotFound(_) => "not_found",
                CacheError::Inconsistent { .. } => "inconsistent",
                CacheError::Backend(KvError::InvalidKey(_)) => "bad_request",
                CacheError::Backend(_) => "backend_unavailable",
                CacheError::Io(_) => "internal_error",
            },
            Self::Kv(e) => match e {
                KvError::InvalidKey(_) => "bad_request",
                _ => "backend_unavailable",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cache(e) => match e {
                CacheError::NotFound(_) => StatusCode::NOT_FOUND,
                // Distinct from not-found on purpose: a complete chunk
                // set with a bad digest is a server-side defect.
                CacheError::Inconsistent { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                CacheError::Backend(KvError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
                CacheError::Backend(_) => StatusCode::BAD_GATEWAY,
                CacheError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Kv(e) => match e {
                KvError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::FileId;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::Cache(CacheError::NotFound(FileId::sanitize("x")));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_inconsistent_maps_to_500_with_distinct_code() {
        let err = ApiError::Cache(CacheError::Inconsistent {
            file_id: FileId::sanitize("x"),
            detail: "checksum mismatch".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "inconsistent");
    }

    #[test]
    fn test_backend_unavailable_maps_to_502() {
        let err = ApiError::Cache(CacheError::Backend(KvError::Protocol("boom".to_string())));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "backend_unavailable");
    }
}
