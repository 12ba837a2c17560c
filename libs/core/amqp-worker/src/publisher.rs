//! Job publisher
//!
//! Serializes jobs as JSON and publishes them to the work queue through the
//! default exchange, waiting for the broker's publisher confirm.

use crate::connection::ManagedConnection;
use crate::error::WorkerError;
use crate::registry::QueueDef;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Publishes jobs to one work queue.
pub struct JobPublisher {
    connection: Arc<ManagedConnection>,
    queue_name: String,
    channel: Mutex<Option<Channel>>,
}

impl JobPublisher {
    pub fn new(connection: Arc<ManagedConnection>, queue_name: impl Into<String>) -> Self {
        Self {
            connection,
            queue_name: queue_name.into(),
            channel: Mutex::new(None),
        }
    }

    pub fn for_queue<Q: QueueDef>(connection: Arc<ManagedConnection>) -> Self {
        Self::new(connection, Q::QUEUE_NAME)
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Publish one job. Any failure (encoding, broker, missing confirm) is returned.
    pub async fn publish<J: Serialize + Sync>(&self, job: &J) -> Result<(), WorkerError> {
        let payload = serde_json::to_vec(job)?;
        self.publish_raw(&payload).await
    }

    /// Publish an already-encoded body.
    pub async fn publish_raw(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let channel = self.channel().await?;

        match self.send(&channel, payload).await {
            Ok(()) => {
                debug!(queue = %self.queue_name, bytes = payload.len(), "Job published");
                Ok(())
            }
            Err(e) => {
                warn!(queue = %self.queue_name, error = %e, "Job publish failed");
                self.reset().await;
                Err(e)
            }
        }
    }

    async fn send(&self, channel: &Channel, payload: &[u8]) -> Result<(), WorkerError> {
        let confirmation = channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(WorkerError::publish(format!(
                "broker nacked message for queue {}",
                self.queue_name
            )));
        }
        Ok(())
    }

    /// Cached channel, or a new one with confirms enabled and the queue declared.
    async fn channel(&self) -> Result<Channel, WorkerError> {
        let mut guard = self.channel.lock().await;
        if let Some(channel) = guard.as_ref() {
            if channel.status().connected() {
                return Ok(channel.clone());
            }
        }

        let channel = self.connection.channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        channel
            .queue_declare(
                &self.queue_name,
                QueueDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        *guard = Some(channel.clone());
        Ok(channel)
    }

    async fn reset(&self) {
        self.channel.lock().await.take();
        if !self.connection.is_connected().await {
            self.connection.invalidate().await;
        }
    }

    /// True when the underlying connection is up.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }
}
