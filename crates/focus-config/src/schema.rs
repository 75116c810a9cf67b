//! Raw configuration schema (as parsed from TOML)

use focus_api::TimerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Timer durations, round length and daily goal
    #[serde(default)]
    pub timer: TimerSettings,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Tick interval in milliseconds (default 1000)
    pub tick_interval_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [timer]
            focus_seconds = 1500
            short_break_seconds = 300
            long_break_seconds = 900
            sessions_per_round = 4
            daily_goal = 8
            require_intention = false

            [service]
            data_dir = "/tmp/focusd-test"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer.focus_seconds, Some(1500));
        assert_eq!(config.timer.require_intention, Some(false));
        assert_eq!(
            config.service.data_dir.as_deref(),
            Some(std::path::Path::new("/tmp/focusd-test"))
        );
    }

    #[test]
    fn parse_negative_values_without_error() {
        let toml_str = r#"
            config_version = 1

            [timer]
            daily_goal = -1
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer.daily_goal, Some(-1));
    }
}
