//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    FileReadError(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(String),

    #[error("configuration validation failed: {0}")]
    ValidationFailed(String),
}
