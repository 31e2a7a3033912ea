//! Health checker error types

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HealthError>;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("server is already running at {addr}")]
    AlreadyServing { addr: String },

    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("health server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("health server did not shut down within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl HealthError {
    pub fn is_shutdown_timeout(&self) -> bool {
        matches!(self, HealthError::ShutdownTimeout(_))
    }
}
