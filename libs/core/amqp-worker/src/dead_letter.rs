//! Dead-letter sink
//!
//! Failed message bodies are published verbatim to a direct exchange bound to a
//! dead-letter queue. The AMQP sink keeps its own connection so trouble on the
//! consumer connection does not stop failures from being recorded, and vice versa.

use crate::config::DeadLetterRoute;
use crate::connection::ManagedConnection;
use crate::error::WorkerError;
use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, ExchangeKind};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Destination for bodies of messages that could not be processed.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Store `body` unchanged.
    async fn publish(&self, body: &[u8]) -> Result<(), WorkerError>;
}

/// Dead-letter sink backed by a RabbitMQ exchange and queue.
pub struct AmqpDeadLetterSink {
    connection: ManagedConnection,
    route: DeadLetterRoute,
    channel: Mutex<Option<Channel>>,
}

impl AmqpDeadLetterSink {
    /// Nothing is opened until the first publish.
    pub fn new(url: impl Into<String>, route: DeadLetterRoute) -> Self {
        Self {
            connection: ManagedConnection::new(url, "dead-letter"),
            route,
            channel: Mutex::new(None),
        }
    }

    pub fn route(&self) -> &DeadLetterRoute {
        &self.route
    }

    /// Channel with the exchange, queue and binding declared. Declarations are
    /// idempotent, so this is repeated after every reconnect.
    async fn channel(&self) -> Result<Channel, WorkerError> {
        let mut guard = self.channel.lock().await;
        if let Some(channel) = guard.as_ref() {
            if channel.status().connected() {
                return Ok(channel.clone());
            }
        }

        let channel = self.connection.channel().await?;
        channel
            .exchange_declare(
                &self.route.exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_declare(
                &self.route.queue,
                QueueDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                &self.route.queue,
                &self.route.exchange,
                &self.route.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        info!(
            exchange = %self.route.exchange,
            queue = %self.route.queue,
            "Dead-letter topology declared"
        );

        *guard = Some(channel.clone());
        Ok(channel)
    }

    async fn send(&self, body: &[u8]) -> Result<(), WorkerError> {
        let channel = self.channel().await?;
        let confirmation = channel
            .basic_publish(
                &self.route.exchange,
                &self.route.routing_key,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default(),
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(WorkerError::publish("broker nacked dead-letter message"));
        }
        Ok(())
    }

    /// Drop the channel and connection so the next publish starts clean.
    async fn reset(&self) {
        self.channel.lock().await.take();
        self.connection.invalidate().await;
    }

    /// Close the sink's connection.
    pub async fn close(&self) -> Result<(), WorkerError> {
        self.channel.lock().await.take();
        self.connection.close().await
    }
}

#[async_trait]
impl DeadLetterSink for AmqpDeadLetterSink {
    async fn publish(&self, body: &[u8]) -> Result<(), WorkerError> {
        match self.send(body).await {
            Ok(()) => {
                debug!(exchange = %self.route.exchange, bytes = body.len(), "Dead-lettered message");
                Ok(())
            }
            Err(e) => {
                self.reset().await;
                Err(e)
            }
        }
    }
}
