//! HTTP routes of the user API.

pub mod callback;
pub mod health;

use crate::state::AppState;
use axum::{Router, routing::get};
use domain_users::{PostgresUserRepository, UserService, handlers};

/// Every application route with state applied
pub fn routes(state: &AppState) -> Router {
    let service = UserService::new(PostgresUserRepository::new(state.db.clone()));

    handlers::router(service, state.publisher.clone())
        .merge(callback::router(callback::CallbackLog::new(
            state.config.callback_log_path.clone(),
        )))
}

/// `/ready`, checking the database
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
