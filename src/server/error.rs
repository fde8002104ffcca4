//! API error types and JSON response formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cache::CacheError;
use crate::reconcile::ReconcileError;
use crate::store::StoreError;
use crate::worker::WorkerError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details in the response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Offline storage is unavailable; nothing was written.
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_UNAVAILABLE",
            message,
        )
    }

    /// The upstream vault server could not be reached and the request is
    /// not cacheable.
    pub fn offline(url: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "OFFLINE",
            "Upstream server unreachable",
        )
        .with_details(serde_json::json!({ "url": url }))
    }

    /// No upstream base URL configured for a request that needs one.
    pub fn no_upstream() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "NO_UPSTREAM",
            "No upstream server configured",
        )
    }

    /// Destination URL for reconciliation is not configured.
    pub fn destination_missing(key: &str) -> Self {
        Self::new(
            StatusCode::PRECONDITION_FAILED,
            "DESTINATION_MISSING",
            format!("Destination config key '{}' is unset", key),
        )
        .with_details(serde_json::json!({ "key": key }))
    }

    /// Malformed multipart payload.
    pub fn invalid_multipart(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_MULTIPART", message)
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Unavailable { .. } => Self::storage_unavailable(err.to_string()),
            StoreError::SchemaTooNew { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SCHEMA_TOO_NEW",
                err.to_string(),
            ),
            StoreError::WriteFailed(msg) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "WRITE_FAILED",
                msg.clone(),
            ),
            StoreError::ReadFailed(msg) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "READ_FAILED",
                msg.clone(),
            ),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match &err {
            CacheError::GenerationNotFound(name) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_NOT_FOUND",
                format!("Cache generation '{}' not found", name),
            ),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::ShareExtractionFailed(msg) => Self::new(
                StatusCode::BAD_REQUEST,
                "SHARE_EXTRACTION_FAILED",
                msg,
            ),
            WorkerError::Store(e) => e.into(),
            WorkerError::Cache(e) => e.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::ConfigMissing(key) => Self::destination_missing(key),
            ReconcileError::UploadFailed(failure) => Self::new(
                StatusCode::BAD_GATEWAY,
                "UPLOAD_FAILED",
                failure.to_string(),
            ),
            ReconcileError::Cancelled { id, name } => Self::new(
                StatusCode::CONFLICT,
                "UPLOAD_CANCELLED",
                format!("Upload of '{}' (record {}) cancelled", name, id),
            ),
            ReconcileError::Store(e) => e.into(),
        }
    }
}
