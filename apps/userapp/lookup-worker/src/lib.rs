//! User Lookup Worker
//!
//! Consumes lookup jobs from RabbitMQ, reads the user from PostgreSQL and
//! POSTs it to the job's callback URL.
//!
//! ## Architecture
//!
//! ```text
//! user_queue (prefetch 1 per consumer)
//!   ↓
//! QueueWorker<UserLookupJob, UserLookupProcessor>
//!   ↓ (scoped read transaction)
//! PostgresUserRepository
//!   ↓ (POST with timeout)
//! callback_url ── 2xx → ack
//!              └─ otherwise → dlx / dl_queue + reject(requeue = false)
//! ```

pub mod config;

use amqp_worker::{
    AmqpDeadLetterSink, HealthState, ManagedConnection, QueueWorker, health_router, init_metrics,
};
use axum_helpers::shutdown_watch;
use config::Config;
use core_config::FromEnv;
use core_config::server::ServerConfig;
use domain_users::{HttpCallbackClient, PostgresUserRepository, UserLookupJob, UserLookupProcessor};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Serve `/health`, `/ready` and `/metrics`
async fn start_health_server(health_state: HealthState, server: ServerConfig) -> Result<()> {
    let app = health_router(health_state);

    let addr = server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind health server to {}", addr))?;

    info!(%addr, "Health server listening");

    axum::serve(listener, app)
        .await
        .wrap_err("Health server failed")?;

    Ok(())
}

/// Run the lookup worker until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if configuration is invalid, PostgreSQL stays unreachable
/// past the connect retries, or the consume loops fail fatally. A down broker
/// is not an error; the consumers keep reconnecting.
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    init_metrics().wrap_err("Failed to install Prometheus recorder")?;

    info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = ?config.environment,
        "Starting user lookup worker"
    );

    let worker_config = config.worker_config();
    info!(
        queue = %worker_config.queue_name,
        dlx = %worker_config.dead_letter.exchange,
        dlq = %worker_config.dead_letter.queue,
        prefetch = worker_config.prefetch,
        consumers = worker_config.consumers,
        "Worker configuration loaded"
    );

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    let callbacks = HttpCallbackClient::new(config.callback_timeout)
        .wrap_err("Failed to build callback HTTP client")?;
    let processor = UserLookupProcessor::new(
        Arc::new(PostgresUserRepository::new(db.clone())),
        Arc::new(callbacks),
    );

    let connection = Arc::new(ManagedConnection::new(
        config.amqp.url.clone(),
        "lookup-consumer",
    ));
    let dead_letters = Arc::new(AmqpDeadLetterSink::new(
        config.amqp.url.clone(),
        worker_config.dead_letter.clone(),
    ));

    let (_shutdown_tx, shutdown_rx) = shutdown_watch();

    let health_state = HealthState::new(
        Arc::clone(&connection),
        config.app.name,
        config.app.version,
        worker_config.queue_name.clone(),
    );
    let health_server = config.health.clone();
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_state, health_server).await {
            error!(error = %e, "Health server failed");
        }
    });

    let worker = QueueWorker::<UserLookupJob, _>::new(
        Arc::clone(&connection),
        processor,
        dead_letters.clone(),
        worker_config,
    );
    let result = worker.run(shutdown_rx).await;

    if let Err(e) = dead_letters.close().await {
        error!(error = %e, "Error closing dead-letter connection");
    }
    if let Err(e) = connection.close().await {
        error!(error = %e, "Error closing consumer connection");
    }
    if let Err(e) = db.close().await {
        error!(error = %e, "Error closing PostgreSQL");
    }

    result.wrap_err("Worker failed")?;
    info!("User lookup worker stopped");
    Ok(())
}
