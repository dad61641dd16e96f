//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A domain-level outcome: unauthenticated, unauthorized, not found, or
    /// an invalid argument. Carries its own taxonomy.
    #[error(transparent)]
    Domain(#[from] wishbox_core::Error),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store operation failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
                | Self::Session(_)
                | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Domain(err) => match err {
                wishbox_core::Error::Unauthenticated => StatusCode::UNAUTHORIZED,
                wishbox_core::Error::NotAuthorized(_) => StatusCode::FORBIDDEN,
                // Uniform policy: a missing or invisible record is always 404.
                wishbox_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
                wishbox_core::Error::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Domain(err) => err.to_string(),
            Self::Database(err) => match err {
                RepositoryError::NotFound => "not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "internal server error".to_string()
                }
            },
            Self::Session(_) | Self::Internal(_) => "internal server error".to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use wishbox_core::policy::Action;
    use wishbox_core::types::WishlistId;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_taxonomy_statuses() {
        assert_eq!(
            status_of(wishbox_core::Error::Unauthenticated.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(wishbox_core::Error::NotAuthorized(Action::Export).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(wishbox_core::Error::NotFound(WishlistId::new(5)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(wishbox_core::Error::InvalidArgument("no product list".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_repository_errors() {
        assert_eq!(
            status_of(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::Conflict("duplicate slug".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RepositoryError::DataCorruption("bad row".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let response =
            AppError::Internal("pool exhausted at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
