//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate};
use focus_api::Task;
use focus_util::{format_day_key, parse_day_key, TaskId};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, StateSnapshot, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Completed focus sessions per local day
            CREATE TABLE IF NOT EXISTS history (
                day TEXT PRIMARY KEY,
                sessions INTEGER NOT NULL DEFAULT 0
            );

            -- Scalar stats
            CREATE TABLE IF NOT EXISTS stats (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );

            -- Unlocked achievements (append-only)
            CREATE TABLE IF NOT EXISTS unlocked_achievements (
                id TEXT PRIMARY KEY,
                unlocked_at TEXT NOT NULL
            );

            -- Tasks
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                completed_sessions INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- State snapshot (single row)
            CREATE TABLE IF NOT EXISTS snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                snapshot_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Local> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .unwrap_or_else(|_| focus_util::now())
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let completed_sessions: i64 = row.get(2)?;
    let created_at: String = row.get(4)?;
    Ok(Task {
        id: TaskId::new(id),
        title: row.get(1)?,
        completed_sessions: completed_sessions.max(0) as u64,
        completed: row.get(3)?,
        created_at: parse_timestamp(&created_at),
    })
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp: parse_timestamp(&timestamp_str),
                event,
            });
        }

        Ok(events)
    }

    fn load_history(&self) -> StoreResult<Vec<(NaiveDate, u32)>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT day, sessions FROM history ORDER BY day")?;
        let rows = stmt.query_map([], |row| {
            let day: String = row.get(0)?;
            let sessions: i64 = row.get(1)?;
            Ok((day, sessions))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (day_str, sessions) = row?;
            match parse_day_key(&day_str) {
                Some(day) => history.push((day, sessions.clamp(0, u32::MAX as i64) as u32)),
                None => warn!(day = %day_str, "Skipping history row with malformed day key"),
            }
        }

        Ok(history)
    }

    fn increment_day(&self, day: NaiveDate) -> StoreResult<u32> {
        let conn = self.conn()?;
        let day_str = format_day_key(day);

        conn.execute(
            r#"
            INSERT INTO history (day, sessions)
            VALUES (?, 1)
            ON CONFLICT(day)
            DO UPDATE SET sessions = sessions + 1
            "#,
            [&day_str],
        )?;

        let sessions: i64 = conn.query_row(
            "SELECT sessions FROM history WHERE day = ?",
            [&day_str],
            |row| row.get(0),
        )?;

        debug!(day = %day_str, sessions, "History day incremented");
        Ok(sessions.clamp(0, u32::MAX as i64) as u32)
    }

    fn load_stats(&self) -> StoreResult<HashMap<String, i64>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT key, value FROM stats")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut stats = HashMap::new();
        for row in rows {
            let (key, value): (String, i64) = row?;
            stats.insert(key, value);
        }

        Ok(stats)
    }

    fn save_stats(&self, values: &[(&str, i64)]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO stats (key, value)
                VALUES (?, ?)
                ON CONFLICT(key)
                DO UPDATE SET value = excluded.value
                "#,
            )?;
            for (key, value) in values {
                stmt.execute(params![key, value])?;
            }
        }

        tx.commit()?;
        debug!(count = values.len(), "Stats saved");
        Ok(())
    }

    fn load_unlocked_achievements(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id FROM unlocked_achievements ORDER BY unlocked_at, id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn add_unlocked_achievements(&self, ids: &[String], at: DateTime<Local>) -> StoreResult<()> {
        let conn = self.conn()?;
        let at = at.to_rfc3339();

        for id in ids {
            conn.execute(
                "INSERT INTO unlocked_achievements (id, unlocked_at) VALUES (?, ?) ON CONFLICT(id) DO NOTHING",
                params![id, at],
            )?;
            debug!(achievement = %id, "Achievement unlock stored");
        }

        Ok(())
    }

    fn create_task(&self, task: &Task) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO tasks (id, title, completed_sessions, completed, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id)
            DO UPDATE SET title = excluded.title
            "#,
            params![
                task.id.as_str(),
                task.title,
                task.completed_sessions as i64,
                task.completed,
                task.created_at.to_rfc3339()
            ],
        )?;

        debug!(task_id = %task.id, "Task stored");
        Ok(())
    }

    fn get_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        let conn = self.conn()?;

        let task = conn
            .query_row(
                "SELECT id, title, completed_sessions, completed, created_at FROM tasks WHERE id = ?",
                [id.as_str()],
                task_from_row,
            )
            .optional()?;

        Ok(task)
    }

    fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, completed_sessions, completed, created_at FROM tasks ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn increment_task_sessions(&self, id: &TaskId) -> StoreResult<Option<u64>> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE tasks SET completed_sessions = completed_sessions + 1 WHERE id = ?",
            [id.as_str()],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        let sessions: i64 = conn.query_row(
            "SELECT completed_sessions FROM tasks WHERE id = ?",
            [id.as_str()],
            |row| row.get(0),
        )?;

        debug!(task_id = %id, sessions, "Task sessions incremented");
        Ok(Some(sessions.max(0) as u64))
    }

    fn mark_task_completed(&self, id: &TaskId) -> StoreResult<bool> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE tasks SET completed = 1 WHERE id = ? AND completed = 0",
            [id.as_str()],
        )?;

        Ok(updated > 0)
    }

    fn load_snapshot(&self) -> StoreResult<Option<StateSnapshot>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row("SELECT snapshot_json FROM snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(s) => {
                let snapshot: StateSnapshot = serde_json::from_str(&s)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &StateSnapshot) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(snapshot)?;

        conn.execute(
            r#"
            INSERT INTO snapshot (id, snapshot_json)
            VALUES (1, ?)
            ON CONFLICT(id)
            DO UPDATE SET snapshot_json = excluded.snapshot_json
            "#,
            [json],
        )?;

        debug!("Snapshot saved");
        Ok(())
    }

    fn reset_progress(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            DELETE FROM history;
            DELETE FROM stats;
            DELETE FROM unlocked_achievements;
            UPDATE tasks SET completed_sessions = 0;
            "#,
        )?;

        debug!("Progress reset");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditEventType;
    use focus_api::{SessionPhase, TimerSnapshot};
    use focus_util::SessionId;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: TaskId::new(id),
            title: title.into(),
            completed_sessions: 0,
            completed: false,
            created_at: focus_util::now(),
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::AchievementUnlocked {
                id: "first_focus".into(),
            }))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0].event,
            AuditEventType::AchievementUnlocked { id } if id == "first_focus"
        ));
        assert!(matches!(events[1].event, AuditEventType::ServiceStarted));
    }

    #[test]
    fn test_history_increment() {
        let store = SqliteStore::in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let next = day.succ_opt().unwrap();

        assert!(store.load_history().unwrap().is_empty());

        assert_eq!(store.increment_day(day).unwrap(), 1);
        assert_eq!(store.increment_day(day).unwrap(), 2);
        assert_eq!(store.increment_day(next).unwrap(), 1);

        let history = store.load_history().unwrap();
        assert_eq!(history, vec![(day, 2), (next, 1)]);
    }

    #[test]
    fn test_stats_upsert() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .save_stats(&[("total_sessions", 3), ("total_focus_minutes", 75)])
            .unwrap();
        store.save_stats(&[("total_sessions", 4)]).unwrap();

        let stats = store.load_stats().unwrap();
        assert_eq!(stats.get("total_sessions"), Some(&4));
        assert_eq!(stats.get("total_focus_minutes"), Some(&75));
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_unlocked_achievements_append_only() {
        let store = SqliteStore::in_memory().unwrap();
        let now = focus_util::now();

        store
            .add_unlocked_achievements(&["first_focus".into()], now)
            .unwrap();
        store
            .add_unlocked_achievements(&["first_focus".into(), "hour_of_focus".into()], now)
            .unwrap();

        let mut ids = store.load_unlocked_achievements().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["first_focus".to_string(), "hour_of_focus".to_string()]);
    }

    #[test]
    fn test_task_counters() {
        let store = SqliteStore::in_memory().unwrap();
        let id = TaskId::new("t1");
        store.create_task(&task("t1", "Write report")).unwrap();

        assert_eq!(store.increment_task_sessions(&id).unwrap(), Some(1));
        assert_eq!(store.increment_task_sessions(&id).unwrap(), Some(2));
        assert_eq!(
            store.increment_task_sessions(&TaskId::new("missing")).unwrap(),
            None
        );

        assert!(store.mark_task_completed(&id).unwrap());
        assert!(!store.mark_task_completed(&id).unwrap());

        let loaded = store.get_task(&id).unwrap().unwrap();
        assert_eq!(loaded.title, "Write report");
        assert_eq!(loaded.completed_sessions, 2);
        assert!(loaded.completed);
        assert_eq!(store.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.load_snapshot().unwrap().is_none());

        let snapshot = StateSnapshot {
            timestamp: focus_util::now(),
            timer: TimerSnapshot {
                session_id: SessionId::new(),
                phase: SessionPhase::ShortBreak,
                remaining_seconds: 120,
                phase_total_seconds: 300,
                is_running: true,
                completed_focus_sessions_this_round: 1,
            },
            intention: None,
            linked_task: Some(TaskId::new("t1")),
        };
        store.save_snapshot(&snapshot).unwrap();

        let loaded = store.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded.timer.phase, SessionPhase::ShortBreak);
        assert_eq!(loaded.timer.remaining_seconds, 120);
        assert_eq!(loaded.linked_task, Some(TaskId::new("t1")));
    }

    #[test]
    fn test_reset_progress() {
        let store = SqliteStore::in_memory().unwrap();
        let id = TaskId::new("t1");
        store.create_task(&task("t1", "Read")).unwrap();
        store.increment_task_sessions(&id).unwrap();
        store.increment_day(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()).unwrap();
        store.save_stats(&[("total_sessions", 1)]).unwrap();
        store
            .add_unlocked_achievements(&["first_focus".into()], focus_util::now())
            .unwrap();

        store.reset_progress().unwrap();

        assert!(store.load_history().unwrap().is_empty());
        assert!(store.load_stats().unwrap().is_empty());
        assert!(store.load_unlocked_achievements().unwrap().is_empty());
        assert_eq!(store.get_task(&id).unwrap().unwrap().completed_sessions, 0);
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(focus_util::DB_FILENAME);
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.increment_day(day).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_history().unwrap(), vec![(day, 1)]);
    }
}
