//! Configuration validation

use crate::schema::RawConfig;
use focus_api::TimerSettings;
use thiserror::Error;

/// Upper bound for any single phase (24 hours)
pub const MAX_PHASE_SECONDS: i64 = 24 * 60 * 60;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveDuration { field: &'static str, value: i64 },

    #[error("{field} must not exceed {max}s, got {value}")]
    DurationTooLong {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("{field} must not be negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("{field} is too large: {value}")]
    CountTooLarge { field: &'static str, value: i64 },

    #[error("tick_interval_ms must be positive")]
    ZeroTickInterval,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_timer_settings(&config.timer);

    if config.service.tick_interval_ms == Some(0) {
        errors.push(ValidationError::ZeroTickInterval);
    }

    errors
}

/// Validate whichever timer fields are present
pub fn validate_timer_settings(settings: &TimerSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let durations = [
        ("focus_seconds", settings.focus_seconds),
        ("short_break_seconds", settings.short_break_seconds),
        ("long_break_seconds", settings.long_break_seconds),
    ];
    for (field, value) in durations {
        if let Some(value) = value {
            errors.extend(validate_duration(field, value));
        }
    }

    let counts = [
        ("sessions_per_round", settings.sessions_per_round),
        ("daily_goal", settings.daily_goal),
    ];
    for (field, value) in counts {
        if let Some(value) = value {
            errors.extend(validate_count(field, value));
        }
    }

    errors
}

fn validate_duration(field: &'static str, value: i64) -> Option<ValidationError> {
    if value <= 0 {
        Some(ValidationError::NonPositiveDuration { field, value })
    } else if value > MAX_PHASE_SECONDS {
        Some(ValidationError::DurationTooLong {
            field,
            value,
            max: MAX_PHASE_SECONDS,
        })
    } else {
        None
    }
}

fn validate_count(field: &'static str, value: i64) -> Option<ValidationError> {
    if value < 0 {
        Some(ValidationError::NegativeCount { field, value })
    } else if value > u32::MAX as i64 {
        Some(ValidationError::CountTooLarge { field, value })
    } else {
        None
    }
}
