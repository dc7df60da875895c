//! Server error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use task_store::TaskStoreError;

/// Machine readable error codes carried in error bodies.
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    pub const OPERATION_FAILED: &str = "OPERATION_FAILED";
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Malformed body or path parameter.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A controller operation failed.
    #[error("fail to {operation} task: {source}")]
    Controller {
        operation: &'static str,
        #[source]
        source: TaskStoreError,
    },
}

impl ServerError {
    /// Wraps a store error raised while running `operation`.
    pub fn controller(operation: &'static str, source: TaskStoreError) -> Self {
        Self::Controller { operation, source }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Client facing failures are all reported as 400, missing tasks included.
        let (status, error_code) = match &self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST),
            ServerError::Controller { source, .. } if source.is_not_found() => {
                (StatusCode::BAD_REQUEST, error_codes::RESOURCE_NOT_FOUND)
            }
            ServerError::Controller { .. } => (StatusCode::BAD_REQUEST, error_codes::OPERATION_FAILED),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
