//! Users Domain
//!
//! User records plus the asynchronous lookup pipeline built on them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      ┌───────────────┐
//! │  Handlers   │─────▶│ JobDispatcher │──▶ user_queue
//! └──────┬──────┘      └───────────────┘        │
//!        │                                      ▼
//! ┌──────▼──────┐                   ┌─────────────────────┐
//! │   Service   │                   │ UserLookupProcessor │──▶ CallbackClient
//! └──────┬──────┘                   └──────────┬──────────┘
//!        │                                     │
//! ┌──────▼─────────────────────────────────────▼──┐
//! │ Repository (in-memory / PostgreSQL)           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use amqp_worker::{JobPublisher, ManagedConnection};
//! use domain_users::{handlers, job::UserQueue, InMemoryUserRepository, UserService};
//!
//! let connection = Arc::new(ManagedConnection::new("amqp://127.0.0.1:5672/%2f", "api"));
//! let publisher = Arc::new(JobPublisher::for_queue::<UserQueue>(connection));
//! let router = handlers::router(UserService::new(InMemoryUserRepository::new()), publisher);
//! ```

pub mod callback;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod job;
pub mod models;
pub mod postgres;
pub mod processor;
pub mod repository;
pub mod service;

pub use callback::{CallbackClient, HttpCallbackClient};
pub use dispatch::JobDispatcher;
pub use error::{UserError, UserResult};
pub use job::{UserLookupJob, UserQueue};
pub use models::{CreateUser, UpdateUser, User, UserResponse};
pub use postgres::PostgresUserRepository;
pub use processor::UserLookupProcessor;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
