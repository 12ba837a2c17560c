//! Queue definitions.
//!
//! Each domain describes its work queue with a `QueueDef` so the publisher and
//! the consumer agree on names and flow control at compile time.

/// Queue definition trait.
///
/// # Example
///
/// ```rust
/// use amqp_worker::QueueDef;
///
/// pub struct UserQueue;
///
/// impl QueueDef for UserQueue {
///     const QUEUE_NAME: &'static str = "user_queue";
/// }
///
/// assert_eq!(UserQueue::DLX_EXCHANGE, "dlx");
/// ```
pub trait QueueDef: Send + Sync {
    /// Work queue the jobs are published to.
    const QUEUE_NAME: &'static str;

    /// Direct exchange failed message bodies are published to.
    const DLX_EXCHANGE: &'static str = "dlx";

    /// Queue bound to the dead-letter exchange.
    const DLQ_QUEUE: &'static str = "dl_queue";

    /// Routing key used for the dead-letter binding and publishes.
    const DLQ_ROUTING_KEY: &'static str = "";

    /// Unacknowledged deliveries allowed per consumer.
    const PREFETCH: u16 = 1;

    fn queue_name() -> &'static str {
        Self::QUEUE_NAME
    }
}
