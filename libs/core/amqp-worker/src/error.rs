//! Worker and job-processing error types.
//!
//! `WorkerError` covers broker plumbing (connections, channels, publishing).
//! `ProcessingError` is what a [`JobHandler`](crate::JobHandler) returns when a
//! job cannot be completed; every variant leads to reject + dead-letter.

use thiserror::Error;

/// Broker and infrastructure errors.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// AMQP connection, channel, or protocol error
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The broker refused a published message
    #[error("Publish not confirmed: {0}")]
    Publish(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shutdown requested
    #[error("Shutdown requested")]
    Shutdown,
}

impl WorkerError {
    pub fn publish(message: impl Into<String>) -> Self {
        WorkerError::Publish(message.into())
    }

    /// True when the failure came from the broker connection itself.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            WorkerError::Amqp(
                lapin::Error::IOError(_)
                    | lapin::Error::InvalidConnectionState(_)
                    | lapin::Error::InvalidChannelState(_)
            )
        )
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Serialization(err.to_string())
    }
}

/// Reasons a job handler gives up on a job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    /// A downstream call (e.g. an HTTP callback) failed or returned non-2xx
    #[error("Downstream call to {target} failed: {message}")]
    Downstream { target: String, message: String },

    /// The backing store failed
    #[error("Store error: {0}")]
    Store(String),

    /// Anything else that went wrong while handling the job
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessingError {
    pub fn downstream(target: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessingError::Downstream {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        ProcessingError::Store(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ProcessingError::Internal(message.into())
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::Downstream { .. } => "downstream",
            ProcessingError::Store(_) => "store",
            ProcessingError::Internal(_) => "internal",
        }
    }
}
