//! Event types for focusd -> client streaming

use chrono::{DateTime, Local};
use focus_util::{SessionId, TaskId};
use serde::{Deserialize, Serialize};

use crate::{AchievementIcon, EngineStateSnapshot, SessionPhase, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: focus_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent on startup and after resets)
    StateChanged(EngineStateSnapshot),

    /// Countdown started or resumed
    TimerStarted {
        session_id: SessionId,
        phase: SessionPhase,
        remaining_seconds: u64,
    },

    /// Countdown paused
    TimerPaused {
        session_id: SessionId,
        phase: SessionPhase,
        remaining_seconds: u64,
    },

    /// Focus start refused until an intention is set
    IntentionRequired,

    /// A phase finished, naturally or by skip
    SessionCompleted {
        session_id: SessionId,
        phase: SessionPhase,
        planned_seconds: u64,
        actual_seconds: u64,
        natural: bool,
        linked_task: Option<TaskId>,
        intention: Option<String>,
    },

    /// Timer moved into a new phase
    PhaseChanged {
        session_id: SessionId,
        phase: SessionPhase,
        remaining_seconds: u64,
        is_running: bool,
    },

    /// Daily goal reached for the first time today
    DailyGoalReached {
        daily_goal: u64,
        goal_streak_days: u64,
    },

    /// Achievement unlocked. Only the first of a batch is celebrated.
    AchievementUnlocked {
        id: String,
        title: String,
        icon: AchievementIcon,
        celebrate: bool,
    },

    /// Timer configuration changed
    ConfigChanged {
        focus_seconds: u64,
        short_break_seconds: u64,
        long_break_seconds: u64,
        sessions_per_round: u32,
        daily_goal: u32,
    },

    /// History, stats and achievements were wiped
    ProgressReset,

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::SessionCompleted {
            session_id: SessionId::new(),
            phase: SessionPhase::Focus,
            planned_seconds: 1500,
            actual_seconds: 1200,
            natural: false,
            linked_task: Some(TaskId::new("write-report")),
            intention: Some("draft intro".into()),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"session_completed\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_version, API_VERSION);
        match parsed.payload {
            EventPayload::SessionCompleted {
                planned_seconds,
                natural,
                ..
            } => {
                assert_eq!(planned_seconds, 1500);
                assert!(!natural);
            }
            other => panic!("Expected SessionCompleted, got {:?}", other),
        }
    }

    #[test]
    fn achievement_event_serialization() {
        let event = Event::new(EventPayload::AchievementUnlocked {
            id: "night_owl".into(),
            title: "Night Owl".into(),
            icon: AchievementIcon::Component("moon".into()),
            celebrate: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            parsed.payload,
            EventPayload::AchievementUnlocked { celebrate: true, .. }
        ));
    }
}
