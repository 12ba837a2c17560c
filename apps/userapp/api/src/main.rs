use amqp_worker::{JobPublisher, ManagedConnection};
use axum_helpers::server::{create_app, create_router, health_router, openapi_router};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::WrapErr;
use std::sync::Arc;
use tracing::{error, info};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);

    info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = ?config.environment,
        "Starting user API"
    );

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .wrap_err("PostgreSQL connection failed")?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .wrap_err("Failed to run migrations")?;
    }

    // The broker is dialled lazily on the first publish, so the API starts
    // even while RabbitMQ is still booting.
    let amqp = Arc::new(ManagedConnection::new(config.amqp.url.clone(), "userapp-api"));
    let publisher = Arc::new(JobPublisher::new(
        Arc::clone(&amqp),
        config.amqp.job_queue.clone(),
    ));
    info!(queue = %publisher.queue_name(), "Job publisher configured");

    let state = AppState {
        config,
        db,
        amqp,
        publisher,
    };

    let app = create_router(api::routes(&state))
        .merge(openapi_router(openapi::api_doc()))
        .merge(health_router(state.config.app.clone()))
        .merge(api::ready_router(state.clone()));

    create_app(app, &state.config.server)
        .await
        .wrap_err("Server error")?;

    info!("Shutting down: closing connections");
    if let Err(e) = state.amqp.close().await {
        error!(error = %e, "Error closing AMQP connection");
    }
    if let Err(e) = state.db.close().await {
        error!(error = %e, "Error closing PostgreSQL");
    }

    info!("User API shutdown complete");
    Ok(())
}
