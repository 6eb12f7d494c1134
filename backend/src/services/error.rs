//! Errors raised by the service layer.

use crate::db::repository::RepositoryError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request was understood but its content is invalid.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The caller is known but may not touch this resource.
    #[error("{0}")]
    PermissionDenied(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// An external collaborator (dealer or sentiment service) failed.
    #[error("Upstream service failure: {0}")]
    Upstream(String),

    /// A background task (password hashing) did not complete.
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Map a repository `NotFound` to `NotFound(message)`.
    ///
    /// Storage messages (constraint names, SQL text) never reach the client;
    /// they are logged here instead.
    pub fn not_found_or_repository(err: RepositoryError, message: &str) -> Self {
        if err.is_not_found() {
            log::debug!("{}: {}", message, err);
            Self::not_found(message)
        } else {
            Self::Repository(err)
        }
    }
}
