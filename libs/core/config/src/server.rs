use crate::{env_or_default, env_parse, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// HTTP listener configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Reads the listener from `HOST` and the given port variable.
    ///
    /// The worker serves its probes on `WORKER_HEALTH_PORT`, the API on `PORT`.
    pub fn from_env_with_port(port_key: &str, default_port: u16) -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse(port_key, &default_port.to_string())?;
        Ok(Self { host, port })
    }

    /// "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// HOST defaults to 0.0.0.0, PORT to 8080.
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_port("PORT", 8080)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 8080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars([("HOST", None::<&str>), ("PORT", None::<&str>)], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
        });
    }

    #[test]
    fn test_server_config_custom_port_key() {
        temp_env::with_vars(
            [("HOST", Some("127.0.0.1")), ("WORKER_HEALTH_PORT", Some("9100"))],
            || {
                let config = ServerConfig::from_env_with_port("WORKER_HEALTH_PORT", 8081).unwrap();
                assert_eq!(config.address(), "127.0.0.1:9100");
            },
        );

        temp_env::with_var_unset("WORKER_HEALTH_PORT", || {
            let config = ServerConfig::from_env_with_port("WORKER_HEALTH_PORT", 8081).unwrap();
            assert_eq!(config.port, 8081);
        });
    }

    #[test]
    fn test_server_config_port_out_of_range() {
        temp_env::with_var("PORT", Some("99999"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }
}
