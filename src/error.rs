//! Error types for the Roombook server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::scheduling::SchedulingError;

/// Application error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    BadRequest = 1,
    UserError = 2,
    InvalidState = 3,
    ParseError = 4,
    NotFound = 5,
    Unauthorized = 6,
    ConcurrentUpdate = 7,
    Internal = 8,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UserError => "USER_ERROR",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::ConcurrentUpdate => "CONCURRENT_UPDATE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// PostgreSQL SQLSTATEs raised when a concurrent transaction got there first:
/// serialization failure, deadlock, exclusion and unique violations.
const CONCURRENT_SQLSTATES: &[&str] = &["40001", "40P01", "23P01", "23505"];

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Concurrent update: {0}")]
    ConcurrentUpdate(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl AppError {
    /// SQLSTATE of the underlying database error, if any
    fn sqlstate(&self) -> Option<String> {
        match self {
            AppError::Database(e) => e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// Whether the error came from losing a race with another transaction
    pub fn is_concurrent_update(&self) -> bool {
        self.sqlstate()
            .is_some_and(|code| CONCURRENT_SQLSTATES.contains(&code.as_str()))
    }
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Structured context: the blocking booking of a conflict, the field a
    /// parse failed on, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;

        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg.clone())
            }
            AppError::ConcurrentUpdate(msg) => {
                tracing::warn!("Concurrent update rejected: {}", msg);
                (StatusCode::CONFLICT, ErrorCode::ConcurrentUpdate, msg.clone())
            }
            AppError::Database(e) if self.is_concurrent_update() => {
                tracing::warn!("Concurrent update rejected: {}", e);
                (
                    StatusCode::CONFLICT,
                    ErrorCode::ConcurrentUpdate,
                    "The resource was modified concurrently; retry the request".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Internal,
                    "Database error".to_string(),
                )
            }
            AppError::Scheduling(err) => match err {
                SchedulingError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg.clone())
                }
                SchedulingError::Conflict(conflict) => {
                    details = serde_json::to_value(conflict).ok();
                    (StatusCode::CONFLICT, ErrorCode::UserError, conflict.to_string())
                }
                SchedulingError::InvalidState {
                    booking_id,
                    status,
                    action,
                } => {
                    details = Some(serde_json::json!({
                        "booking_id": booking_id,
                        "status": status,
                        "action": action.to_string(),
                    }));
                    (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::InvalidState, err.to_string())
                }
                SchedulingError::Parse { field, .. } => {
                    details = Some(serde_json::json!({ "field": field }));
                    (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::ParseError, err.to_string())
                }
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Internal,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: code.as_str().to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
