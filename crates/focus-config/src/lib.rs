//! Configuration parsing and validation for focusd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Timer durations, round length and daily goal
//! - Service settings (data directory, tick interval)
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<FocusConfig> {
    let content = std::fs::read_to_string(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "Config file read");
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<FocusConfig> {
    match load_config(path.as_ref()) {
        Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.as_ref().display(), "No config file, using defaults");
            Ok(FocusConfig::default())
        }
        other => other,
    }
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<FocusConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(FocusConfig::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = parse_config("config_version = 1").unwrap();
        assert_eq!(config.timer, TimerConfig::default());
        assert!(config.timer.require_intention);
        assert_eq!(config.timer.focus_seconds, DEFAULT_FOCUS_SECONDS);
    }

    #[test]
    fn parse_timer_overrides() {
        let config = r#"
            config_version = 1

            [timer]
            focus_seconds = 3000
            sessions_per_round = 0
            daily_goal = 0
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.timer.focus_seconds, 3000);
        assert_eq!(config.timer.short_break_seconds, DEFAULT_SHORT_BREAK_SECONDS);
        assert_eq!(config.timer.sessions_per_round, 0);
        assert_eq!(config.timer.daily_goal, 0);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_durations() {
        let config = r#"
            config_version = 1

            [timer]
            focus_seconds = 0
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[timer]\ndaily_goal = 3\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.timer.daily_goal, 3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timer, TimerConfig::default());
    }
}
