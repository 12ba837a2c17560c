//! Core worker traits and the generic `QueueWorker`.
//!
//! - `QueueJob` for job payloads
//! - `JobHandler` for the code that processes them
//! - `QueueWorker` for the consume loops

use crate::config::WorkerConfig;
use crate::connection::ManagedConnection;
use crate::dead_letter::DeadLetterSink;
use crate::error::{ProcessingError, WorkerError};
use crate::metrics::WorkerMetrics;
use crate::settle::{settle, Settlement};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Trait for queue job payloads.
pub trait QueueJob: Serialize + DeserializeOwned + Send + Sync {
    /// Identifier used in log lines.
    fn job_id(&self) -> String;
}

/// What a handler did with a job it did not fail on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran to completion.
    Completed,
    /// Nothing to do for this job (e.g. the target record is gone).
    /// Skipped jobs are acknowledged, never dead-lettered.
    Skipped { reason: String },
}

impl JobOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        JobOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// Trait for job handlers.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl JobHandler<UserLookupJob> for UserLookupProcessor {
///     async fn handle(&self, job: &UserLookupJob) -> Result<JobOutcome, ProcessingError> {
///         let user = self.load(job.id).await?;
///         self.callbacks.post(&job.callback_url, &user).await?;
///         Ok(JobOutcome::Completed)
///     }
///
///     fn name(&self) -> &'static str {
///         "user_lookup"
///     }
/// }
/// ```
#[async_trait]
pub trait JobHandler<J: QueueJob>: Send + Sync {
    /// Handle one job. `Err` leads to reject + dead-letter.
    async fn handle(&self, job: &J) -> Result<JobOutcome, ProcessingError>;

    /// Handler name for logs and metric labels.
    fn name(&self) -> &'static str;

    /// Override to check downstream dependencies.
    async fn health_check(&self) -> Result<bool, ProcessingError> {
        Ok(true)
    }
}

/// Why a consume session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    /// The session was running and then broke (stream ended, settle failed).
    Interrupted,
}

/// Runs `consumers` independent consume loops against one queue.
///
/// Each loop owns its own channel with `basic.qos(prefetch)` and manual acks,
/// and handles deliveries strictly one at a time. When a channel or the
/// connection breaks, the loop backs off (1s doubling up to
/// `config.max_backoff`) and consumes again on a fresh channel.
pub struct QueueWorker<J, H>
where
    J: QueueJob,
    H: JobHandler<J>,
{
    connection: Arc<ManagedConnection>,
    handler: Arc<H>,
    dead_letters: Arc<dyn DeadLetterSink>,
    config: WorkerConfig,
    metrics: WorkerMetrics,
    _phantom: PhantomData<fn() -> J>,
}

impl<J, H> QueueWorker<J, H>
where
    J: QueueJob + 'static,
    H: JobHandler<J> + 'static,
{
    pub fn new(
        connection: Arc<ManagedConnection>,
        handler: H,
        dead_letters: Arc<dyn DeadLetterSink>,
        config: WorkerConfig,
    ) -> Self {
        Self::with_arc_handler(connection, Arc::new(handler), dead_letters, config)
    }

    pub fn with_arc_handler(
        connection: Arc<ManagedConnection>,
        handler: Arc<H>,
        dead_letters: Arc<dyn DeadLetterSink>,
        config: WorkerConfig,
    ) -> Self {
        let metrics = WorkerMetrics::new(&config.queue_name, handler.name());
        Self {
            connection,
            handler,
            dead_letters,
            config,
            metrics,
            _phantom: PhantomData,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn connection(&self) -> Arc<ManagedConnection> {
        Arc::clone(&self.connection)
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// A message being handled when shutdown arrives is settled first.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        info!(
            queue = %self.config.queue_name,
            consumers = self.config.consumers,
            prefetch = self.config.prefetch,
            handler = self.handler.name(),
            "Starting queue worker"
        );

        let mut join_set = JoinSet::new();
        for index in 0..self.config.consumers {
            let consumer = ConsumeLoop::<J, H> {
                connection: Arc::clone(&self.connection),
                handler: Arc::clone(&self.handler),
                dead_letters: Arc::clone(&self.dead_letters),
                config: self.config.clone(),
                metrics: self.metrics.clone(),
                tag: self.config.consumer_tag(index),
                _phantom: PhantomData,
            };
            join_set.spawn(consumer.run(shutdown.clone()));
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Consumer task panicked");
            }
        }

        info!(queue = %self.config.queue_name, "Queue worker stopped");
        Ok(())
    }
}

/// State owned by one spawned consume loop.
struct ConsumeLoop<J, H> {
    connection: Arc<ManagedConnection>,
    handler: Arc<H>,
    dead_letters: Arc<dyn DeadLetterSink>,
    config: WorkerConfig,
    metrics: WorkerMetrics,
    tag: String,
    _phantom: PhantomData<fn() -> J>,
}

impl<J, H> ConsumeLoop<J, H>
where
    J: QueueJob + 'static,
    H: JobHandler<J> + 'static,
{
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.session(&mut shutdown).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Interrupted) => {
                    // It was healthy until now, so start the backoff over.
                    consecutive_errors = 1;
                }
                Err(e) => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    if e.is_connection_error() {
                        self.connection.invalidate().await;
                    }
                    warn!(
                        consumer = %self.tag,
                        error = %e,
                        consecutive_errors,
                        "Failed to start consuming"
                    );
                }
            }

            let backoff = self.config.backoff_delay(consecutive_errors);
            warn!(
                consumer = %self.tag,
                backoff_secs = backoff.as_secs(),
                "Reconnecting after backoff"
            );
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        info!(consumer = %self.tag, "Consumer stopped");
    }

    /// Open a channel, start consuming and settle deliveries until the
    /// session breaks or shutdown is requested.
    async fn session(&self, shutdown: &mut watch::Receiver<bool>) -> Result<SessionEnd, WorkerError> {
        let channel = self.connection.channel().await?;
        channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await?;
        channel
            .queue_declare(
                &self.config.queue_name,
                QueueDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;
        let mut deliveries = channel
            .basic_consume(
                &self.config.queue_name,
                &self.tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(
            consumer = %self.tag,
            queue = %self.config.queue_name,
            prefetch = self.config.prefetch,
            "Consuming"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(consumer = %self.tag, "Received shutdown signal, stopping consumer");
                        if let Err(e) = channel.close(200, "shutdown").await {
                            debug!(error = %e, "Channel close failed during shutdown");
                        }
                        return Ok(SessionEnd::Shutdown);
                    }
                }
                next = deliveries.next() => match next {
                    Some(Ok(delivery)) => {
                        let settlement = settle::<J, H>(
                            &delivery.data,
                            &delivery.acker,
                            self.handler.as_ref(),
                            self.dead_letters.as_ref(),
                            &self.metrics,
                        )
                        .await;

                        if settlement == Settlement::Unsettled {
                            return Ok(SessionEnd::Interrupted);
                        }
                    }
                    Some(Err(e)) => {
                        warn!(consumer = %self.tag, error = %e, "Delivery stream error");
                        return Ok(SessionEnd::Interrupted);
                    }
                    None => {
                        warn!(consumer = %self.tag, "Delivery stream ended");
                        return Ok(SessionEnd::Interrupted);
                    }
                }
            }
        }
    }
}
