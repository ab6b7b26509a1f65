//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur while initializing logging
#[derive(Error, Debug)]
pub enum LoggingError {
    /// A global subscriber was already installed
    #[error("failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// The provided filter directive could not be parsed
    #[error("invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}
