use amqp_worker::{DeadLetterRoute, WorkerConfig};
use core_config::amqp::AmqpConfig;
use core_config::server::ServerConfig;
use core_config::{AppInfo, ConfigError, Environment, FromEnv, app_info, env_parse};
use database::postgres::PostgresConfig;
use std::time::Duration;

/// Worker configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub database: PostgresConfig,
    pub amqp: AmqpConfig,
    /// Probe and metrics listener (`WORKER_HEALTH_PORT`, default 8081)
    pub health: ServerConfig,
    /// Deadline for each outbound callback POST
    pub callback_timeout: Duration,
    /// Independent prefetch-limited consumers
    pub consumers: usize,
}

impl Config {
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new(self.amqp.job_queue.clone())
            .with_dead_letter(DeadLetterRoute::new(
                self.amqp.dlx_exchange.clone(),
                self.amqp.dlq_queue.clone(),
            ))
            .with_prefetch(self.amqp.prefetch)
            .with_consumers(self.consumers)
            .with_consumer_tag_prefix(self.app.name)
    }
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse("CALLBACK_TIMEOUT_SECS", "10")?;
        if timeout_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "CALLBACK_TIMEOUT_SECS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            database: PostgresConfig::from_env()?,
            amqp: AmqpConfig::from_env()?,
            health: ServerConfig::from_env_with_port("WORKER_HEALTH_PORT", 8081)?,
            callback_timeout: Duration::from_secs(timeout_secs),
            consumers: env_parse("WORKER_CONSUMERS", "1")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: (&str, Option<&str>) = ("DATABASE_URL", Some("postgresql://localhost/userapp"));

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                DB,
                ("CALLBACK_TIMEOUT_SECS", None),
                ("WORKER_CONSUMERS", None),
                ("WORKER_HEALTH_PORT", None),
                ("AMQP_JOB_QUEUE", None),
                ("AMQP_DLX_EXCHANGE", None),
                ("AMQP_DLQ_QUEUE", None),
                ("AMQP_PREFETCH", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.callback_timeout, Duration::from_secs(10));
                assert_eq!(config.consumers, 1);
                assert_eq!(config.health.port, 8081);

                let worker = config.worker_config();
                assert_eq!(worker.queue_name, "user_queue");
                assert_eq!(worker.prefetch, 1);
                assert_eq!(worker.consumers, 1);
                assert_eq!(worker.dead_letter.exchange, "dlx");
                assert_eq!(worker.dead_letter.queue, "dl_queue");
                assert_eq!(worker.dead_letter.routing_key, "");
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                DB,
                ("CALLBACK_TIMEOUT_SECS", Some("3")),
                ("WORKER_CONSUMERS", Some("4")),
                ("AMQP_JOB_QUEUE", Some("lookups")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.callback_timeout, Duration::from_secs(3));

                let worker = config.worker_config();
                assert_eq!(worker.queue_name, "lookups");
                assert_eq!(worker.consumers, 4);
            },
        );
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        temp_env::with_vars([DB, ("CALLBACK_TIMEOUT_SECS", Some("0"))], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("CALLBACK_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn test_database_url_is_required() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }
}
