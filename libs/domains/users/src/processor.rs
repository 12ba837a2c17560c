use amqp_worker::{JobHandler, JobOutcome, ProcessingError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::callback::CallbackClient;
use crate::job::UserLookupJob;
use crate::models::UserResponse;
use crate::repository::UserRepository;

/// Resolves a [`UserLookupJob`] against the user store and posts the result
/// to the job's callback URL.
///
/// A missing user is acknowledged as skipped: redelivering it would never
/// find the row.
pub struct UserLookupProcessor<R, C> {
    repository: Arc<R>,
    callbacks: Arc<C>,
}

impl<R, C> UserLookupProcessor<R, C>
where
    R: UserRepository,
    C: CallbackClient,
{
    pub fn new(repository: Arc<R>, callbacks: Arc<C>) -> Self {
        Self {
            repository,
            callbacks,
        }
    }
}

#[async_trait]
impl<R, C> JobHandler<UserLookupJob> for UserLookupProcessor<R, C>
where
    R: UserRepository + 'static,
    C: CallbackClient + 'static,
{
    async fn handle(&self, job: &UserLookupJob) -> Result<JobOutcome, ProcessingError> {
        // The repository scopes its session to this call, so it is released
        // before the (possibly slow) callback goes out.
        let user = self
            .repository
            .get_by_id(job.id)
            .await
            .map_err(|e| ProcessingError::store(e.to_string()))?;

        let Some(user) = user else {
            warn!(user_id = job.id, "User not found");
            return Ok(JobOutcome::skipped(format!("user {} not found", job.id)));
        };

        let payload = UserResponse::from(user);
        self.callbacks
            .deliver(&job.callback_url, &payload)
            .await
            .inspect_err(|e| {
                warn!(callback_url = %job.callback_url, error = %e, "Failed to send data to callback");
            })?;

        info!(user_id = job.id, callback_url = %job.callback_url, "User data delivered");
        Ok(JobOutcome::Completed)
    }

    fn name(&self) -> &'static str {
        "user_lookup"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserError;
    use crate::models::CreateUser;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use serde_json::Map;
    use std::sync::Mutex;

    /// Records deliveries; fails for URLs containing "down."
    #[derive(Default)]
    struct RecordingCallbacks {
        delivered: Mutex<Vec<(String, UserResponse)>>,
    }

    #[async_trait]
    impl CallbackClient for RecordingCallbacks {
        async fn deliver(&self, url: &str, payload: &UserResponse) -> Result<(), ProcessingError> {
            if url.contains("down.") {
                return Err(ProcessingError::downstream(url, "connection refused"));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            Ok(())
        }
    }

    async fn seeded() -> Arc<InMemoryUserRepository> {
        let repo = InMemoryUserRepository::new();
        repo.create(CreateUser {
            name: "Ada".to_string(),
            age: 36,
            md: Map::new(),
            email: "ada@example.com".to_string(),
        })
        .await
        .unwrap();
        Arc::new(repo)
    }

    #[tokio::test]
    async fn test_existing_user_is_delivered() {
        let repo = seeded().await;
        let callbacks = Arc::new(RecordingCallbacks::default());
        let processor = UserLookupProcessor::new(Arc::clone(&repo), Arc::clone(&callbacks));

        let outcome = processor
            .handle(&UserLookupJob::new(1, "http://ok.test/cb"))
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::Completed);
        let delivered = callbacks.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "http://ok.test/cb");
        assert_eq!(delivered[0].1.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_callback_failure_is_an_error() {
        let repo = seeded().await;
        let processor =
            UserLookupProcessor::new(Arc::clone(&repo), Arc::new(RecordingCallbacks::default()));

        let err = processor
            .handle(&UserLookupJob::new(1, "http://down.test/cb"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "downstream");
    }

    #[tokio::test]
    async fn test_missing_user_is_skipped_without_callback() {
        let repo = seeded().await;
        let callbacks = Arc::new(RecordingCallbacks::default());
        let processor = UserLookupProcessor::new(Arc::clone(&repo), Arc::clone(&callbacks));

        let outcome = processor
            .handle(&UserLookupJob::new(9999, "http://ok.test/cb"))
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Skipped { .. }));
        assert!(callbacks.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(|_| Err(UserError::Database("pool timed out".to_string())));
        let processor =
            UserLookupProcessor::new(Arc::new(mock_repo), Arc::new(RecordingCallbacks::default()));

        let err = processor
            .handle(&UserLookupJob::new(1, "http://ok.test/cb"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "store");
    }

    #[tokio::test]
    async fn test_session_closed_once_per_job_on_every_path() {
        let repo = seeded().await;
        let (opened_before, closed_before) = repo.session_counts();
        let processor =
            UserLookupProcessor::new(Arc::clone(&repo), Arc::new(RecordingCallbacks::default()));

        let jobs = [
            UserLookupJob::new(1, "http://ok.test/cb"),
            UserLookupJob::new(1, "http://down.test/cb"),
            UserLookupJob::new(9999, "http://ok.test/cb"),
        ];
        for job in &jobs {
            let _ = processor.handle(job).await;
        }

        let (opened, closed) = repo.session_counts();
        assert_eq!(opened - opened_before, jobs.len());
        assert_eq!(closed - closed_before, jobs.len());
    }
}
