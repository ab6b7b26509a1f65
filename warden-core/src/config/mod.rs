//! Configuration management
//!
//! TOML-based configuration with defaults and validation. Credentials for
//! the controlled identities are resolved by the transport collaborator;
//! this config only names the identities and tunes the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Controlled identities; the first entry is the primary identity
    #[serde(default)]
    pub identities: Vec<IdentityConfig>,

    /// Policy store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Engine tunables
    #[serde(default)]
    pub engine: EngineTunables,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// One controlled identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Stable actor id of the identity on the platform
    pub actor_id: String,
}

/// Policy store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite database file
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("warden.db") }
    }
}

/// Engine tunables
///
/// Defaults match the platform limits and windows the engine was built
/// against; all of them are overridable per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineTunables {
    /// Hard ceiling on group member count for accepting an invitation
    pub group_capacity: usize,

    /// Maximum length (in characters) of a stored canonical name
    pub name_max_chars: usize,

    /// Unauthorized kicks tolerated before escalating to a kick of the
    /// offender (escalation happens on observation threshold + 1)
    pub violation_threshold: u32,

    /// Period on which the violation tally is cleared
    #[serde(with = "humantime_serde")]
    pub violation_clear_period: Duration,

    /// Window within which repeated commands to one group are deduplicated
    #[serde(with = "humantime_serde")]
    pub dedup_window: Duration,

    /// Delay inserted when the responder rotation wraps around during
    /// invitation cancellation
    #[serde(with = "humantime_serde")]
    pub invite_cancel_backoff: Duration,

    /// Message prefixes that mark a command
    pub command_prefixes: Vec<String>,

    /// Optional greeting sent to a group right after it is claimed
    pub greeting: Option<String>,
}

impl Default for EngineTunables {
    fn default() -> Self {
        Self {
            group_capacity: 493,
            name_max_chars: 50,
            violation_threshold: 2,
            violation_clear_period: Duration::from_secs(120),
            dedup_window: Duration::from_secs(2),
            invite_cancel_backoff: Duration::from_millis(500),
            command_prefixes: vec!["warden:".to_string()],
            greeting: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to emit JSON-formatted logs
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl WardenConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize the configuration to TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Check invariants that the engine depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identities.len() < 2 {
            return Err(ConfigError::ValidationFailed(format!(
                "at least 2 identities are required, found {}",
                self.identities.len()
            )));
        }
        if self.engine.group_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "group_capacity must be positive".to_string(),
            ));
        }
        if self.engine.name_max_chars == 0 {
            return Err(ConfigError::ValidationFailed(
                "name_max_chars must be positive".to_string(),
            ));
        }
        if self.engine.command_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "command prefixes must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_platform_limits() {
        let tunables = EngineTunables::default();
        assert_eq!(tunables.group_capacity, 493);
        assert_eq!(tunables.name_max_chars, 50);
        assert_eq!(tunables.violation_threshold, 2);
        assert_eq!(tunables.violation_clear_period, Duration::from_secs(120));
        assert_eq!(tunables.dedup_window, Duration::from_secs(2));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = WardenConfig::default();
        config.identities = vec![
            IdentityConfig { actor_id: "w0".to_string() },
            IdentityConfig { actor_id: "w1".to_string() },
        ];
        config.engine.greeting = Some("on duty".to_string());

        let raw = config.to_toml().unwrap();
        let parsed = WardenConfig::from_toml(&raw).unwrap();
        assert_eq!(parsed.identities.len(), 2);
        assert_eq!(parsed.engine.greeting.as_deref(), Some("on duty"));
        assert_eq!(parsed.engine.dedup_window, Duration::from_secs(2));
    }

    #[test]
    fn test_parse_human_durations() {
        let raw = r#"
            [[identities]]
            actor_id = "w0"

            [[identities]]
            actor_id = "w1"

            [engine]
            group_capacity = 100
            name_max_chars = 50
            violation_threshold = 2
            violation_clear_period = "2m"
            dedup_window = "2s"
            invite_cancel_backoff = "500ms"
            command_prefixes = ["guard:"]
        "#;
        let config = WardenConfig::from_toml(raw).unwrap();
        config.validate().unwrap();
        assert_eq!(config.engine.violation_clear_period, Duration::from_secs(120));
        assert_eq!(config.engine.invite_cancel_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_validation_rejects_single_identity() {
        let mut config = WardenConfig::default();
        config.identities = vec![IdentityConfig { actor_id: "only".to_string() }];
        assert!(config.validate().is_err());
    }
}
