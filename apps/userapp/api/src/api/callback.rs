//! Demo receiver for lookup callbacks.
//!
//! Point `callback_url` at `http://<api>/callback` to watch results arrive in
//! the callback log.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_helpers::error_response;
use domain_users::models::MessageResponse;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Append-only log file shared by all callback requests
#[derive(Clone)]
pub struct CallbackLog {
    path: Arc<PathBuf>,
    // Serializes appends so concurrent lines never interleave
    write_lock: Arc<Mutex<()>>,
}

impl CallbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_ref())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

pub fn router(log: CallbackLog) -> Router {
    Router::new()
        .route("/callback", post(receive_callback))
        .with_state(log)
}

#[utoipa::path(
    post,
    path = "/callback",
    tag = "callback",
    request_body(content = serde_json::Value, content_type = "application/json"),
    responses(
        (status = 200, description = "Logged", body = MessageResponse),
        (status = 400, description = "Body is not JSON", body = axum_helpers::ErrorResponse)
    )
)]
pub async fn receive_callback(State(log): State<CallbackLog>, body: Bytes) -> Response {
    let line = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(data) => format!("Received data: {data}"),
        Err(e) => {
            warn!(error = %e, "Callback body is not JSON");
            let line = format!("Failed to process data: {e}");
            if let Err(io) = log.append(&line).await {
                error!(error = %io, path = %log.path.display(), "Failed to write callback log");
            }
            return error_response(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                "Failed to process data",
            );
        }
    };

    if let Err(e) = log.append(&line).await {
        error!(error = %e, path = %log.path.display(), "Failed to write callback log");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalServerError",
            "Failed to record callback",
        );
    }

    info!(bytes = body.len(), "Callback received");
    (StatusCode::OK, Json(MessageResponse::new("Data received"))).into_response()
}
