//! Error types for the library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::form::FieldErrors;

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NoSuchData = 3,
    BadValue = 4,
    Duplicate = 5,
    BookCheckedOut = 6,
    AlreadyReturned = 7,
}

/// Business rule a command ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// The book already has an open loan
    BookCheckedOut,
    /// The loan was closed before this request reached it
    AlreadyReturned,
}

impl Conflict {
    pub fn message(&self) -> &'static str {
        match self {
            Conflict::BookCheckedOut => "This book is checked out.",
            Conflict::AlreadyReturned => "This loan has already been returned",
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Conflict::BookCheckedOut => ErrorCode::BookCheckedOut,
            Conflict::AlreadyReturned => ErrorCode::AlreadyReturned,
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// One message per violated rule, for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, errors) = match &self {
            AppError::NotFound(msg) => (ErrorCode::NoSuchData, msg.clone(), Vec::new()),
            AppError::Validation(fields) => {
                let code = if fields.contains("library_id") {
                    ErrorCode::Duplicate
                } else {
                    ErrorCode::BadValue
                };
                (code, "Validation failed".to_string(), fields.messages())
            }
            AppError::Conflict(conflict) => {
                (conflict.code(), conflict.message().to_string(), vec![conflict.message().to_string()])
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (ErrorCode::DbFailure, "Database error".to_string(), Vec::new())
            }
            AppError::BadRequest(msg) => (ErrorCode::BadValue, msg.clone(), Vec::new()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (ErrorCode::Failure, "Internal server error".to_string(), Vec::new())
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
