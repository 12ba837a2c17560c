use amqp_worker::{QueueDef, QueueJob};
use serde::{Deserialize, Serialize};

/// `user_queue` with the default `dlx` / `dl_queue` dead-letter route
pub struct UserQueue;

impl QueueDef for UserQueue {
    const QUEUE_NAME: &'static str = "user_queue";
}

/// Request to look up a user and POST it to `callback_url`.
///
/// Wire format: `{"id": 1, "callback_url": "http://..."}`. Both fields are
/// required; a body missing either fails to decode and is dead-lettered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLookupJob {
    pub id: i32,
    pub callback_url: String,
}

impl UserLookupJob {
    pub fn new(id: i32, callback_url: impl Into<String>) -> Self {
        Self {
            id,
            callback_url: callback_url.into(),
        }
    }
}

impl QueueJob for UserLookupJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }
}
