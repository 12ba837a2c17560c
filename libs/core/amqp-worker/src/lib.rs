//! AMQP Worker Framework
//!
//! Consumes JSON jobs from a RabbitMQ queue with at-least-once semantics.
//!
//! ## Features
//!
//! - **Manual acks**: a delivery is acknowledged only after its handler finishes
//! - **Dead-lettering**: failed bodies go verbatim to a direct exchange/queue,
//!   and the delivery is rejected without requeue
//! - **Flow control**: `basic.qos` prefetch per consumer (1 by default)
//! - **Reconnects**: long-lived connections that are rebuilt lazily
//! - **Prometheus metrics** and **health endpoints**
//!
//! ## Example
//!
//! ```ignore
//! use amqp_worker::{AmqpDeadLetterSink, ManagedConnection, QueueDef, QueueWorker, WorkerConfig};
//!
//! struct UserQueue;
//! impl QueueDef for UserQueue {
//!     const QUEUE_NAME: &'static str = "user_queue";
//! }
//!
//! let config = WorkerConfig::from_queue_def::<UserQueue>();
//! let connection = Arc::new(ManagedConnection::new(&url, "consumer"));
//! let dead_letters = Arc::new(AmqpDeadLetterSink::new(&url, config.dead_letter.clone()));
//! let worker = QueueWorker::new(connection, processor, dead_letters, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod connection;
mod dead_letter;
mod error;
mod health;
pub mod metrics;
mod publisher;
mod registry;
mod settle;
mod worker;

pub use config::{DeadLetterRoute, WorkerConfig};
pub use connection::ManagedConnection;
pub use dead_letter::{AmqpDeadLetterSink, DeadLetterSink};
pub use error::{ProcessingError, WorkerError};
pub use health::{health_router, HealthState};
pub use metrics::{init_metrics, WorkerMetrics};
pub use publisher::JobPublisher;
pub use registry::QueueDef;
pub use settle::{settle, Acknowledge, Settlement};
pub use worker::{JobHandler, JobOutcome, QueueJob, QueueWorker};
