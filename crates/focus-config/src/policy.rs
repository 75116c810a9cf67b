//! Validated configuration structures

use crate::schema::{RawConfig, RawServiceConfig};
use crate::validation::{validate_timer_settings, ValidationError};
use focus_api::{SessionPhase, TimerSettings};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FOCUS_SECONDS: u64 = 25 * 60;
pub const DEFAULT_SHORT_BREAK_SECONDS: u64 = 5 * 60;
pub const DEFAULT_LONG_BREAK_SECONDS: u64 = 15 * 60;
pub const DEFAULT_SESSIONS_PER_ROUND: u32 = 4;
pub const DEFAULT_DAILY_GOAL: u32 = 8;

/// Validated configuration ready for use by the engine
#[derive(Debug, Clone, Default)]
pub struct FocusConfig {
    pub service: ServiceConfig,
    pub timer: TimerConfig,
}

impl FocusConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let timer = TimerConfig::default()
            .with_settings(&raw.timer)
            .unwrap_or_default();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            timer,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(focus_util::default_data_dir),
            tick_interval: Duration::from_millis(raw.tick_interval_ms.unwrap_or(1000)),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: focus_util::default_data_dir(),
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Timer configuration read by the session engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub focus_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
    /// 0 disables long breaks
    pub sessions_per_round: u32,
    /// 0 disables the daily goal
    pub daily_goal: u32,
    pub require_intention: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_seconds: DEFAULT_FOCUS_SECONDS,
            short_break_seconds: DEFAULT_SHORT_BREAK_SECONDS,
            long_break_seconds: DEFAULT_LONG_BREAK_SECONDS,
            sessions_per_round: DEFAULT_SESSIONS_PER_ROUND,
            daily_goal: DEFAULT_DAILY_GOAL,
            require_intention: true,
        }
    }
}

impl TimerConfig {
    /// Configured full duration of a phase
    pub fn duration_for(&self, phase: SessionPhase) -> u64 {
        match phase {
            SessionPhase::Focus => self.focus_seconds,
            SessionPhase::ShortBreak => self.short_break_seconds,
            SessionPhase::LongBreak => self.long_break_seconds,
        }
    }

    pub fn long_breaks_enabled(&self) -> bool {
        self.sessions_per_round > 0
    }

    /// Check the invariants a countdown relies on
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_timer_settings(&self.to_settings())
    }

    /// Apply settings on top of this config. Missing fields keep their value;
    /// on any validation error nothing is applied.
    pub fn with_settings(&self, settings: &TimerSettings) -> Result<TimerConfig, Vec<ValidationError>> {
        let errors = validate_timer_settings(settings);
        if !errors.is_empty() {
            return Err(errors);
        }

        // Validated above: durations are positive, counts fit in u32
        Ok(TimerConfig {
            focus_seconds: settings
                .focus_seconds
                .map_or(self.focus_seconds, |v| v as u64),
            short_break_seconds: settings
                .short_break_seconds
                .map_or(self.short_break_seconds, |v| v as u64),
            long_break_seconds: settings
                .long_break_seconds
                .map_or(self.long_break_seconds, |v| v as u64),
            sessions_per_round: settings
                .sessions_per_round
                .map_or(self.sessions_per_round, |v| v as u32),
            daily_goal: settings.daily_goal.map_or(self.daily_goal, |v| v as u32),
            require_intention: settings.require_intention.unwrap_or(self.require_intention),
        })
    }

    pub fn to_settings(&self) -> TimerSettings {
        TimerSettings {
            focus_seconds: Some(clamp_i64(self.focus_seconds)),
            short_break_seconds: Some(clamp_i64(self.short_break_seconds)),
            long_break_seconds: Some(clamp_i64(self.long_break_seconds)),
            sessions_per_round: Some(self.sessions_per_round as i64),
            daily_goal: Some(self.daily_goal as i64),
            require_intention: Some(self.require_intention),
        }
    }
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
