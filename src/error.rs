//! Error types for Lendly server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    StorageFailure = 3,
    NotFound = 5,
    Unavailable = 7,
    DuplicateIdentifier = 8,
    DuplicateContact = 9,
    Conflict = 13,
    BadValue = 18,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Duplicate contact: {0}")]
    DuplicateContact(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Numeric code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::DuplicateIdentifier(_) => ErrorCode::DuplicateIdentifier,
            AppError::DuplicateContact(_) => ErrorCode::DuplicateContact,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Unavailable(_) => ErrorCode::Unavailable,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Database(_) | AppError::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// True for failures of the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Storage(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateIdentifier(_)
            | AppError::DuplicateContact(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::NotFound(msg)
            | AppError::DuplicateIdentifier(msg)
            | AppError::DuplicateContact(msg)
            | AppError::Conflict(msg)
            | AppError::Unavailable(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
