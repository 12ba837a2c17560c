//! Per-delivery settlement.
//!
//! A delivery is decoded, handed to the job handler, and then settled exactly
//! once: acknowledged when the handler finished (or chose to skip the
//! job), otherwise dead-lettered and rejected without requeue. The dead-letter
//! publish runs before the reject so a broker hiccup between the two never
//! loses the body; a failed dead-letter publish is logged and does not change
//! the outcome.

use crate::dead_letter::DeadLetterSink;
use crate::error::WorkerError;
use crate::metrics::WorkerMetrics;
use crate::worker::{JobHandler, JobOutcome, QueueJob};
use async_trait::async_trait;
use lapin::acker::Acker;
use lapin::options::{BasicAckOptions, BasicRejectOptions};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Acknowledgement handle for a single delivery.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    async fn ack(&self) -> Result<(), WorkerError>;

    /// Reject without requeue.
    async fn reject(&self) -> Result<(), WorkerError>;
}

#[async_trait]
impl Acknowledge for Acker {
    async fn ack(&self) -> Result<(), WorkerError> {
        Acker::ack(self, BasicAckOptions::default())
            .await
            .map(|_| ())
            .map_err(WorkerError::from)
    }

    async fn reject(&self) -> Result<(), WorkerError> {
        Acker::reject(self, BasicRejectOptions { requeue: false })
            .await
            .map(|_| ())
            .map_err(WorkerError::from)
    }
}

/// How a delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Rejected { dead_lettered: bool },
    /// The ack/reject itself failed; the broker will redeliver once the
    /// channel closes.
    Unsettled,
}

impl Settlement {
    pub fn label(&self) -> &'static str {
        match self {
            Settlement::Acked => "acked",
            Settlement::Rejected { .. } => "rejected",
            Settlement::Unsettled => "unsettled",
        }
    }
}

/// Decode, handle and settle one delivery body.
pub async fn settle<J, H>(
    body: &[u8],
    acker: &dyn Acknowledge,
    handler: &H,
    dead_letters: &dyn DeadLetterSink,
    metrics: &WorkerMetrics,
) -> Settlement
where
    J: QueueJob,
    H: JobHandler<J> + ?Sized,
{
    metrics.job_received();
    let started = Instant::now();

    let failure = match serde_json::from_slice::<J>(body) {
        Err(e) => {
            warn!(
                handler = handler.name(),
                error = %e,
                body = %String::from_utf8_lossy(body),
                "Malformed job message"
            );
            Some(format!("malformed job: {e}"))
        }
        Ok(job) => match handler.handle(&job).await {
            Ok(JobOutcome::Completed) => {
                debug!(job_id = %job.job_id(), handler = handler.name(), "Job completed");
                None
            }
            Ok(JobOutcome::Skipped { reason }) => {
                info!(job_id = %job.job_id(), handler = handler.name(), %reason, "Job skipped");
                None
            }
            Err(e) => {
                warn!(
                    job_id = %job.job_id(),
                    handler = handler.name(),
                    kind = e.kind(),
                    error = %e,
                    "Job failed"
                );
                Some(e.to_string())
            }
        },
    };

    let settlement = match failure {
        None => match acker.ack().await {
            Ok(()) => Settlement::Acked,
            Err(e) => {
                error!(error = %e, "Failed to ack delivery");
                Settlement::Unsettled
            }
        },
        Some(reason) => {
            let dead_lettered = match dead_letters.publish(body).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, %reason, "Failed to dead-letter message");
                    false
                }
            };
            metrics.dead_letter(dead_lettered);

            match acker.reject().await {
                Ok(()) => Settlement::Rejected { dead_lettered },
                Err(e) => {
                    error!(error = %e, "Failed to reject delivery");
                    Settlement::Unsettled
                }
            }
        }
    };

    metrics.job_settled(&settlement, started.elapsed());
    settlement
}
