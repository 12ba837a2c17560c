//! Prometheus metrics for queue workers

use crate::error::WorkerError;
use crate::settle::Settlement;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder.
///
/// Call this once at startup. Subsequent calls are no-ops.
pub fn init_metrics() -> Result<(), WorkerError> {
    PROMETHEUS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| WorkerError::Config(format!("failed to install Prometheus recorder: {e}")))?;
        info!("Prometheus metrics initialized");
        Ok::<_, WorkerError>(handle)
    })?;
    Ok(())
}

pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render metrics in Prometheus text format (empty before `init_metrics`)
pub fn render_metrics() -> String {
    prometheus_handle().map(|h| h.render()).unwrap_or_default()
}

/// Labeled counters for one queue/handler pair
#[derive(Clone, Debug)]
pub struct WorkerMetrics {
    queue: String,
    handler: String,
}

impl WorkerMetrics {
    pub fn new(queue: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            handler: handler.into(),
        }
    }

    pub fn job_received(&self) {
        counter!(
            "amqp_worker_jobs_received_total",
            "queue" => self.queue.clone(),
            "handler" => self.handler.clone()
        )
        .increment(1);
    }

    /// Record how a delivery was settled and how long it took.
    pub fn job_settled(&self, settlement: &Settlement, duration: Duration) {
        counter!(
            "amqp_worker_jobs_settled_total",
            "queue" => self.queue.clone(),
            "handler" => self.handler.clone(),
            "outcome" => settlement.label()
        )
        .increment(1);

        histogram!(
            "amqp_worker_job_duration_seconds",
            "queue" => self.queue.clone(),
            "handler" => self.handler.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn dead_letter(&self, published: bool) {
        let status = if published { "published" } else { "failed" };
        counter!(
            "amqp_worker_dead_letters_total",
            "queue" => self.queue.clone(),
            "status" => status
        )
        .increment(1);
    }
}
