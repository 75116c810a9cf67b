//! Core events emitted by the engine

use focus_api::{AchievementIcon, SessionPhase};
use focus_config::TimerConfig;
use focus_util::{SessionId, TaskId};

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
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

    /// Timer entered a new phase or was reset within one
    PhaseChanged {
        session_id: SessionId,
        phase: SessionPhase,
        remaining_seconds: u64,
        is_running: bool,
    },

    /// Daily goal met for the first time today
    DailyGoalReached {
        daily_goal: u64,
        goal_streak_days: u64,
    },

    AchievementUnlocked {
        id: String,
        title: String,
        icon: AchievementIcon,
        /// Only the first unlock of a batch is celebrated
        celebrate: bool,
    },

    ConfigChanged(TimerConfig),

    /// History, stats and achievements were wiped
    ProgressReset,
}
