use crate::{env_or_default, env_parse, ConfigError, FromEnv};

/// Broker connection and topology settings shared by the API and the worker.
#[derive(Clone, Debug)]
pub struct AmqpConfig {
    pub url: String,
    pub job_queue: String,
    pub dlx_exchange: String,
    pub dlq_queue: String,
    pub prefetch: u16,
}

impl AmqpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl FromEnv for AmqpConfig {
    /// Reads:
    /// - AMQP_URL: defaults to the local broker's default vhost
    /// - AMQP_JOB_QUEUE: defaults to "user_queue"
    /// - AMQP_DLX_EXCHANGE / AMQP_DLQ_QUEUE: default "dlx" / "dl_queue"
    /// - AMQP_PREFETCH: defaults to 1
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let prefetch: u16 = env_parse("AMQP_PREFETCH", "1")?;
        if prefetch == 0 {
            return Err(ConfigError::ParseError {
                key: "AMQP_PREFETCH".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            url: env_or_default("AMQP_URL", &defaults.url),
            job_queue: env_or_default("AMQP_JOB_QUEUE", &defaults.job_queue),
            dlx_exchange: env_or_default("AMQP_DLX_EXCHANGE", &defaults.dlx_exchange),
            dlq_queue: env_or_default("AMQP_DLQ_QUEUE", &defaults.dlq_queue),
            prefetch,
        })
    }
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self {
            url: "amqp://127.0.0.1:5672/%2f".to_string(),
            job_queue: "user_queue".to_string(),
            dlx_exchange: "dlx".to_string(),
            dlq_queue: "dl_queue".to_string(),
            prefetch: 1,
        }
    }
}
