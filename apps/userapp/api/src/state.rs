//! Shared application state.

use amqp_worker::{JobPublisher, ManagedConnection};
use database::postgres::DatabaseConnection;
use std::sync::Arc;

/// Cloned into every handler; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: DatabaseConnection,
    /// Broker connection used by the job publisher
    pub amqp: Arc<ManagedConnection>,
    pub publisher: Arc<JobPublisher>,
}
