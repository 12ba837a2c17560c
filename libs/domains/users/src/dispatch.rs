use amqp_worker::{JobPublisher, WorkerError};
use async_trait::async_trait;

use crate::job::UserLookupJob;

/// Hands lookup jobs to the queue. The HTTP layer only sees this trait.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch(&self, job: &UserLookupJob) -> Result<(), WorkerError>;
}

#[async_trait]
impl JobDispatcher for JobPublisher {
    async fn dispatch(&self, job: &UserLookupJob) -> Result<(), WorkerError> {
        self.publish(job).await?;
        tracing::info!(user_id = job.id, queue = %self.queue_name(), "Lookup job published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::UserQueue;
    use amqp_worker::ManagedConnection;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_dispatch_surfaces_broker_errors() {
        let connection = Arc::new(ManagedConnection::new("amqp://127.0.0.1:1/%2f", "api"));
        let publisher = JobPublisher::for_queue::<UserQueue>(connection);

        let result = publisher
            .dispatch(&UserLookupJob::new(1, "http://ok.test/cb"))
            .await;
        assert!(result.is_err());
    }
}
