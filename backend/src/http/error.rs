//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ServiceError;

/// API error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error, malformed JSON)
    BadRequest(String),
    /// Wrong credentials
    Unauthorized(String),
    /// Not signed in, or not allowed to touch the resource
    Forbidden(String),
    MethodNotAllowed,
    /// The dealer or sentiment service failed
    Upstream(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    pub fn authentication_required() -> Self {
        AppError::Forbidden("Authentication required".to_string())
    }

    pub fn invalid_json() -> Self {
        AppError::BadRequest("invalid JSON".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Repository(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Repository(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Unauthorized(msg) => ApiError::new("UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => ApiError::new("FORBIDDEN", msg),
            AppError::MethodNotAllowed => ApiError::new("METHOD_NOT_ALLOWED", "Method not allowed"),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                ApiError::new("UPSTREAM_ERROR", "Upstream service unavailable")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiError::new("INTERNAL_ERROR", "Internal server error")
            }
            AppError::Repository(e) if e.is_not_found() => {
                tracing::debug!("Repository lookup failed: {}", e);
                ApiError::new("NOT_FOUND", "Not found")
            }
            AppError::Repository(e) => {
                tracing::error!("Repository error: {}", e);
                if e.is_retryable() {
                    ApiError::new("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
                } else {
                    ApiError::new("REPOSITORY_ERROR", "Internal server error")
                }
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(msg),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::PermissionDenied(msg) => AppError::Forbidden(msg),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(ServiceError::InvalidCredentials.to_string())
            }
            ServiceError::Upstream(msg) => AppError::Upstream(msg),
            ServiceError::Internal(msg) => AppError::Internal(msg),
            ServiceError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
