//! Shared types for the focusd API

use chrono::{DateTime, Local, NaiveDate};
use focus_util::{SessionId, TaskId};
use serde::{Deserialize, Serialize};

/// The timer's current activity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionPhase {
    pub fn is_break(&self) -> bool {
        matches!(self, SessionPhase::ShortBreak | SessionPhase::LongBreak)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Focus => "focus",
            SessionPhase::ShortBreak => "short_break",
            SessionPhase::LongBreak => "long_break",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer settings as supplied by a config file or a `set_config` command.
///
/// Values are signed so that negative input reaches validation instead of
/// failing to parse. Missing fields keep the current (or default) value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus_seconds: Option<i64>,
    pub short_break_seconds: Option<i64>,
    pub long_break_seconds: Option<i64>,
    /// 0 disables long breaks
    pub sessions_per_round: Option<i64>,
    /// 0 disables the daily goal
    pub daily_goal: Option<i64>,
    /// Require an intention before a focus phase may start
    pub require_intention: Option<bool>,
}

/// Derived focus statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_minutes: u64,
    pub completed_tasks: u64,
    pub night_sessions: u64,
    pub morning_sessions: u64,
    pub longest_session_minutes: u64,
    pub focus_streak_days: u64,
    pub goal_streak_days: u64,
    pub perfect_weeks: u64,
    /// Resets at the local day boundary
    pub daily_sessions_completed: u64,
    pub daily_goal: u64,
}

/// Current timer state for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    pub remaining_seconds: u64,
    pub phase_total_seconds: u64,
    pub is_running: bool,
    pub completed_focus_sessions_this_round: u64,
}

/// Progress towards an achievement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    /// 0.0 - 100.0
    pub percentage: f64,
}

impl Progress {
    pub fn new(current: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            (current.min(total) as f64 / total as f64 * 100.0).min(100.0)
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Achievement icon, resolved to an actual glyph or component only by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AchievementIcon {
    Emoji(String),
    Component(String),
}

/// Achievement for UI display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: AchievementIcon,
    pub unlocked: bool,
    pub progress: Progress,
}

/// Completed focus sessions on one local day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u32,
    pub is_today: bool,
}

/// A task focus sessions can be linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed_sessions: u64,
    pub completed: bool,
    pub created_at: DateTime<Local>,
}

/// Full engine state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStateSnapshot {
    pub api_version: u32,
    pub timer: TimerSnapshot,
    pub stats: Stats,
    pub intention: Option<String>,
    pub linked_task: Option<TaskId>,
    pub unlocked_achievements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serialization() {
        let json = serde_json::to_string(&SessionPhase::LongBreak).unwrap();
        assert_eq!(json, "\"long_break\"");
        assert_eq!(SessionPhase::ShortBreak.to_string(), "short_break");
        assert!(SessionPhase::LongBreak.is_break());
        assert!(!SessionPhase::Focus.is_break());
    }

    #[test]
    fn progress_is_clamped() {
        let p = Progress::new(15, 10);
        assert_eq!(p.current, 15);
        assert_eq!(p.percentage, 100.0);

        let p = Progress::new(3, 12);
        assert_eq!(p.percentage, 25.0);
    }

    #[test]
    fn icon_serialization_is_tagged() {
        let icon = AchievementIcon::Emoji("🔥".into());
        let json = serde_json::to_string(&icon).unwrap();
        assert!(json.contains("\"kind\":\"emoji\""));

        let parsed: AchievementIcon =
            serde_json::from_str(r#"{"kind":"component","value":"moon"}"#).unwrap();
        assert_eq!(parsed, AchievementIcon::Component("moon".into()));
    }

    #[test]
    fn timer_settings_accept_partial_input() {
        let settings: TimerSettings = serde_json::from_str(r#"{"focus_seconds": 1800}"#).unwrap();
        assert_eq!(settings.focus_seconds, Some(1800));
        assert_eq!(settings.daily_goal, None);
    }
}
