//! Error types for Libris server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::FieldError;

/// Entity kinds named in client-facing error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Author,
    Book,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Author => "author",
            Entity::Book => "book",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Entity::Author => "Author",
            Entity::Book => "Book",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {} ID format", .0.as_str())]
    InvalidId(Entity),

    #[error("{} not found", .0.title())]
    NotFound(Entity),

    #[error("Validation failed: {} violation(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Referential violation: {0}")]
    Referential(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Per-field violations, present on validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidId(_) | AppError::Validation(_) | AppError::Referential(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::Upstream(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, errors) = match self {
            AppError::InvalidId(entity) => (format!("Invalid {} ID format", entity.as_str()), None),
            AppError::NotFound(entity) => (format!("{} not found", entity.title()), None),
            AppError::Validation(violations) => ("Validation failed".to_string(), Some(violations)),
            AppError::Referential(msg) | AppError::Authentication(msg) => (msg, None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Server Error".to_string(), None)
            }
            AppError::Session(e) => {
                tracing::error!("Session store error: {:?}", e);
                ("Server Error".to_string(), None)
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                ("Server Error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Server Error".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
            errors,
        });

        (status, body).into_response()
    }
}

/// Parser details stay in the log; clients get a fixed message
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::Validation(vec![FieldError::new("body", MALFORMED_BODY)])
    }
}

const MALFORMED_BODY: &str = "Request body must be valid JSON.";

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::Referential("The specified Author does not exist.".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound(Entity::Book).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Authentication("nope".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_server_errors_are_opaque() {
        let err = AppError::Internal("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
