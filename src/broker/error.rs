//! Broker Error Types

use crate::queue::QueueError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Message broker already initialized")]
    AlreadyInitialized,

    #[error("Message broker was never initialized")]
    NotInitialized,

    #[error("Failed to spawn the consumer thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("Message queue failure: {0}")]
    Queue(#[from] QueueError),

    #[error("Broker state unavailable: {message}")]
    Lock { message: String },

    #[error("Failed to write rendered output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Message broker is shutting down")]
    ShutDown,

    #[error("Unknown message source: {id}")]
    UnknownSource { id: usize },
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors raised while loading broker configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
