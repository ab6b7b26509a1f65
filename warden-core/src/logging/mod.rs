//! Logging subsystem
//!
//! Unified logging for the engine on top of the `tracing` crate: an
//! env-filterable subscriber with optional JSON output. The `WARDEN_LOG`
//! environment variable overrides the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Environment variable consulted for filter directives
pub const LOG_ENV_VAR: &str = "WARDEN_LOG";

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The minimum log level to display
    pub level: LogLevel,
    /// Whether to include target module information
    pub with_target: bool,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info, with_target: true, json_format: false }
    }
}

impl LogConfig {
    /// Create a new LogConfig with the specified level
    pub fn new(level: LogLevel) -> Self {
        Self { level, ..Default::default() }
    }

    /// Set whether to use JSON formatting
    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

/// Initialize logging with the default configuration at the given level
pub fn init_logging(level: LogLevel) -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::new(level))
}

/// Initialize logging with a full configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .map_err(|e| LoggingError::InvalidConfiguration(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_format {
        registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(config.with_target)).try_init()
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}
