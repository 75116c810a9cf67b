//! Store trait definitions

use chrono::{DateTime, Local, NaiveDate};
use focus_api::{Task, TimerSnapshot};
use focus_util::TaskId;
use std::collections::HashMap;

use crate::{AuditEvent, StoreResult};

/// Main store trait
///
/// Writes are independent of each other; callers must not assume ordering
/// or durability across keys.
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // History ledger

    /// All recorded days with their completed focus session counts
    fn load_history(&self) -> StoreResult<Vec<(NaiveDate, u32)>>;

    /// Add one completed focus session to a day, returning the new count
    fn increment_day(&self, day: NaiveDate) -> StoreResult<u32>;

    // Stats

    /// Load all stored stat values
    fn load_stats(&self) -> StoreResult<HashMap<String, i64>>;

    /// Upsert stat values
    fn save_stats(&self, values: &[(&str, i64)]) -> StoreResult<()>;

    // Achievements

    /// Ids of every unlocked achievement
    fn load_unlocked_achievements(&self) -> StoreResult<Vec<String>>;

    /// Record newly unlocked achievements; already present ids are kept as is
    fn add_unlocked_achievements(&self, ids: &[String], at: DateTime<Local>) -> StoreResult<()>;

    // Tasks

    fn create_task(&self, task: &Task) -> StoreResult<()>;

    fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>>;

    fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Add one completed session to a task. Returns the new count, or `None`
    /// if the task does not exist.
    fn increment_task_sessions(&self, id: &TaskId) -> StoreResult<Option<u64>>;

    /// Mark a task done. Returns `true` only if it was open before.
    fn mark_task_completed(&self, id: &TaskId) -> StoreResult<bool>;

    // State snapshot

    /// Load last saved snapshot
    fn load_snapshot(&self) -> StoreResult<Option<StateSnapshot>>;

    /// Save state snapshot
    fn save_snapshot(&self, snapshot: &StateSnapshot) -> StoreResult<()>;

    // Reset

    /// Wipe history, stats, unlocked achievements and task session counters
    fn reset_progress(&self) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// State snapshot for crash recovery
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StateSnapshot {
    /// Timestamp of snapshot
    pub timestamp: DateTime<Local>,

    /// Timer state at snapshot time
    pub timer: TimerSnapshot,

    /// Intention for the upcoming or running focus session
    pub intention: Option<String>,

    /// Linked task for the upcoming or running focus session
    pub linked_task: Option<TaskId>,
}
