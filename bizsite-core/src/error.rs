use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the content layer and the HTTP handlers.
///
/// Validation and not-found errors are user-correctable and rendered as-is.
/// Persistence and internal errors are logged with their detail and rendered
/// with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A required field was absent or blank.
    pub fn missing(field: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: format!("The field {} is required", field),
        }
    }

    /// A field was present but malformed.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status for this error class.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Name of the offending field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            return AppError::Conflict("A record with the same unique value already exists".into());
        }
        AppError::Persistence(err)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", err))
    }
}

/// JSON envelope used for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Persistence(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::Unauthorized => "Please log in to access this page".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            success: false,
            message,
            field: self.field().map(str::to_string),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
