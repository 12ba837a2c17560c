use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
///
/// ```json
/// {
///   "error": {
///     "type": "NotFound",
///     "message": "User not found"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error identifier, e.g. "BadRequest"
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind: kind.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

/// Build a JSON error response.
///
/// ```rust,ignore
/// use axum_helpers::errors::error_response;
/// use axum::http::StatusCode;
///
/// let response = error_response(StatusCode::BAD_REQUEST, "BadRequest", "id is required");
/// ```
pub fn error_response(
    status: StatusCode,
    kind: impl Into<String>,
    message: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(kind, message))).into_response()
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route");
    error_response(
        StatusCode::NOT_FOUND,
        "NotFound",
        format!("No route for {}", uri.path()),
    )
}
