use core_config::amqp::AmqpConfig;
use core_config::server::ServerConfig;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse};
use database::postgres::PostgresConfig;
use std::path::PathBuf;

pub use core_config::Environment;

/// API configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub amqp: AmqpConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// File the `/callback` receiver appends to
    pub callback_log_path: PathBuf,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            database: PostgresConfig::from_env()?, // DATABASE_URL is required
            amqp: AmqpConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            callback_log_path: PathBuf::from(env_or_default("CALLBACK_LOG_PATH", "log.txt")),
            run_migrations: env_parse("RUN_MIGRATIONS", "false")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/userapp")),
                ("CALLBACK_LOG_PATH", None),
                ("RUN_MIGRATIONS", None),
                ("PORT", None),
                ("AMQP_JOB_QUEUE", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.callback_log_path, PathBuf::from("log.txt"));
                assert!(!config.run_migrations);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.amqp.job_queue, "user_queue");
                assert_eq!(config.app.name, "userapp_api");
            },
        );
    }

    #[test]
    fn test_database_url_is_required() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_run_migrations_must_be_bool() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/userapp")),
                ("RUN_MIGRATIONS", Some("sometimes")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("RUN_MIGRATIONS"));
            },
        );
    }
}
