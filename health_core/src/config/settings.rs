use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{HealthError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthConfig {
    pub server: ServerConfig,
    pub routes: RouteConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub alive_path: String,
    pub ready_path: String,
}

/// Optional database probed for readiness by the server binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_ms: 100,
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            alive_path: "/alive".to_string(),
            ready_path: "/ready".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl RouteConfig {
    /// Both paths must be absolute and distinct to be mounted on one router.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for path in [&self.alive_path, &self.ready_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::Message(format!(
                    "Route path must start with '/': {}",
                    path
                )));
            }
        }

        if self.alive_path == self.ready_path {
            return Err(ConfigError::Message(
                "Liveness and readiness routes must differ".to_string(),
            ));
        }

        Ok(())
    }
}

impl HealthConfig {
    /// Defaults, then `health.toml` if present, then `HEALTH_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&HealthConfig::default())?);

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("health").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("HEALTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let health_config: HealthConfig = config.try_deserialize()?;

        health_config.validate()?;

        Ok(health_config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.shutdown_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Shutdown timeout must be greater than 0".to_string(),
            ));
        }

        self.routes.validate()?;

        if matches!(&self.database.url, Some(url) if url.is_empty()) {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address()
            .parse()
            .map_err(|_| HealthError::InvalidAddress(self.bind_address()))
    }
}
