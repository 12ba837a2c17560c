//! # Axum Helpers
//!
//! Shared HTTP plumbing for the user API and the worker's probe server.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, health checks, graceful shutdown
//! - **[`errors`]**: The `{"error": {"type", "message"}}` response body
//! - **[`extractors`]**: `ValidatedJson`
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_app, create_router};
//! use core_config::server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let routes = Router::new(); // Add your routes
//!     create_app(create_router(routes), &ServerConfig::default()).await
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, create_app, create_router, health_router,
    openapi_router, run_health_checks, shutdown_signal, shutdown_watch,
};

pub use errors::{ErrorBody, ErrorResponse, error_response};

pub use extractors::ValidatedJson;
