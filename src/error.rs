// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// All variants are recoverable by the caller and surface as a JSON
/// `{"error": ...}` body; none are fatal to the process.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found (session/schedule/question/student absent)
    NotFound(String),

    // 409 Conflict (e.g., duplicate student)
    Conflict(String),

    // 409 Conflict - re-entrant completion or restart of a finished session
    AlreadyCompleted(String),

    // 400 Bad Request - answer submitted outside [0, total_questions)
    InvalidQuestionIndex(u32),

    // 404 Not Found - the schedule matcher yielded an empty set
    NoActiveSchedule,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::AlreadyCompleted(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidQuestionIndex(index) => (
                StatusCode::BAD_REQUEST,
                format!("Question index {} is out of range", index),
            ),
            AppError::NoActiveSchedule => (
                StatusCode::NOT_FOUND,
                "No quiz is currently active".to_string(),
            ),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
