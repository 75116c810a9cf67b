//! Audit event types

use chrono::{DateTime, Local};
use focus_api::SessionPhase;
use focus_util::{SessionId, TaskId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Timer configuration changed
    ConfigChanged {
        focus_seconds: u64,
        short_break_seconds: u64,
        long_break_seconds: u64,
        sessions_per_round: u32,
        daily_goal: u32,
    },

    /// Phase completed, naturally or by skip
    SessionCompleted {
        session_id: SessionId,
        phase: SessionPhase,
        planned_seconds: u64,
        actual_seconds: u64,
        natural: bool,
        linked_task: Option<TaskId>,
    },

    /// Achievement unlocked
    AchievementUnlocked { id: String },

    /// Task created
    TaskCreated { task_id: TaskId, title: String },

    /// Task marked done
    TaskCompleted { task_id: TaskId },

    /// History, stats and achievements wiped
    ProgressReset,
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self::at(focus_util::now(), event)
    }

    pub fn at(timestamp: DateTime<Local>, event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp,
            event,
        }
    }
}
