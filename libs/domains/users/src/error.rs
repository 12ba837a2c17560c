use amqp_worker::WorkerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Email {0} already exists")]
    DuplicateEmail(String),

    /// Unique violation raised by the store after the duplicate pre-check passed
    #[error("User with email '{0}' was created concurrently")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Error sending message to queue: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<WorkerError> for UserError {
    fn from(e: WorkerError) -> Self {
        UserError::Queue(e.to_string())
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            UserError::NotFound => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            UserError::DuplicateEmail(_) | UserError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "BadRequest", self.to_string())
            }
            UserError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            UserError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "A database error occurred".to_string(),
                )
            }
            UserError::Queue(msg) => {
                tracing::error!("Queue publish error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    self.to_string(),
                )
            }
            UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}
