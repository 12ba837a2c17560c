//! Worker configuration
//!
//! `WorkerConfig` describes the work queue, the dead-letter route, and how many
//! prefetch-limited consumers to run.

use crate::registry::QueueDef;
use std::time::Duration;

/// Where failed message bodies go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterRoute {
    /// Direct exchange name
    pub exchange: String,
    /// Queue bound to the exchange
    pub queue: String,
    /// Binding and publish routing key
    pub routing_key: String,
}

impl DeadLetterRoute {
    pub fn new(exchange: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            queue: queue.into(),
            routing_key: String::new(),
        }
    }

    pub fn from_queue_def<Q: QueueDef>() -> Self {
        Self {
            exchange: Q::DLX_EXCHANGE.to_string(),
            queue: Q::DLQ_QUEUE.to_string(),
            routing_key: Q::DLQ_ROUTING_KEY.to_string(),
        }
    }
}

impl Default for DeadLetterRoute {
    fn default() -> Self {
        Self::new("dlx", "dl_queue")
    }
}

/// Configuration for the queue worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work queue name
    pub queue_name: String,

    /// Dead-letter exchange/queue/routing key
    pub dead_letter: DeadLetterRoute,

    /// Unacknowledged deliveries per consumer (basic.qos)
    pub prefetch: u16,

    /// Number of independent consume loops, each on its own channel
    pub consumers: usize,

    /// Prefix for consumer tags; the loop index is appended
    pub consumer_tag_prefix: String,

    /// Upper bound for reconnect backoff
    pub max_backoff: Duration,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from a QueueDef
    pub fn from_queue_def<Q: QueueDef>() -> Self {
        Self {
            queue_name: Q::QUEUE_NAME.to_string(),
            dead_letter: DeadLetterRoute::from_queue_def::<Q>(),
            prefetch: Q::PREFETCH,
            ..Self::new(Q::QUEUE_NAME)
        }
    }

    /// Create a new WorkerConfig with default dead-letter route and one consumer
    pub fn new(queue_name: impl Into<String>) -> Self {
        let queue_name = queue_name.into();
        Self {
            consumer_tag_prefix: format!("{}-consumer", queue_name),
            queue_name,
            dead_letter: DeadLetterRoute::default(),
            prefetch: 1,
            consumers: 1,
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = name.into();
        self
    }

    pub fn with_dead_letter(mut self, route: DeadLetterRoute) -> Self {
        self.dead_letter = route;
        self
    }

    /// Set prefetch (at least 1)
    pub fn with_prefetch(mut self, prefetch: u16) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    /// Set the number of consume loops (at least 1)
    pub fn with_consumers(mut self, count: usize) -> Self {
        self.consumers = count.max(1);
        self
    }

    pub fn with_consumer_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.consumer_tag_prefix = prefix.into();
        self
    }

    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    /// Consumer tag for the loop at `index`
    pub fn consumer_tag(&self, index: usize) -> String {
        format!("{}-{}", self.consumer_tag_prefix, index)
    }

    /// Delay before reconnect attempt `attempt` (1-based): 1s, 2s, 4s, ... capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = Duration::from_secs(2u64.saturating_pow(exponent));
        delay.min(self.max_backoff)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("jobs")
    }
}
