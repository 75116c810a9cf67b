//! Command types for the focusd protocol

use focus_util::TaskId;
use serde::{Deserialize, Serialize};

use crate::{
    AchievementView, DayCount, EngineStateSnapshot, Event, Stats, Task, TimerSettings,
    TimerSnapshot, API_VERSION,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    /// The command
    pub command: Command,
}

fn default_api_version() -> u32 {
    API_VERSION
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedVersion,
    IntentionRequired,
    TaskNotFound,
    ConfigError,
    StoreError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get current engine state
    GetState,

    /// Start or resume the countdown
    Start,

    /// Pause the countdown
    Pause,

    /// Complete the current phase immediately
    Skip,

    /// Change timer settings (missing fields keep their current value)
    SetConfig { timer: TimerSettings },

    /// Link the upcoming focus session to a task, or unlink with `null`
    LinkTask { task_id: Option<TaskId> },

    /// Attach an intention to the upcoming focus session
    SetIntention { text: Option<String> },

    /// Create a task
    AddTask { title: String },

    /// Mark a task as done
    CompleteTask { task_id: TaskId },

    /// List all tasks
    ListTasks,

    /// Current stats
    GetStats,

    /// The 7 local days ending today
    GetWeek,

    /// Every day of the current month
    GetMonth,

    /// Achievement catalog with progress
    ListAchievements,

    /// Wipe history, stats, achievements and task counters
    ResetProgress,

    /// Reload configuration from disk
    ReloadConfig,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(EngineStateSnapshot),
    Timer(TimerSnapshot),
    ConfigUpdated,
    TaskLinked { task_id: Option<TaskId> },
    IntentionSet,
    TaskCreated(Task),
    TaskCompleted(Task),
    Tasks { tasks: Vec<Task> },
    Stats(Stats),
    Days { days: Vec<DayCount> },
    Achievements { achievements: Vec<AchievementView> },
    ProgressReset,
    ConfigReloaded,
    Pong,
}

/// One line on the service output stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    Response(Response),
    Event(Event),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = Request::new(1, Command::GetState);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 1);
        assert!(matches!(parsed.command, Command::GetState));
    }

    #[test]
    fn request_without_version_defaults() {
        let parsed: Request =
            serde_json::from_str(r#"{"request_id": 7, "command": {"type": "skip"}}"#).unwrap();
        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.command, Command::Skip));
    }

    #[test]
    fn set_config_command_parses() {
        let parsed: Request = serde_json::from_str(
            r#"{"request_id": 2, "command": {"type": "set_config", "timer": {"focus_seconds": 3000, "daily_goal": 4}}}"#,
        )
        .unwrap();

        match parsed.command {
            Command::SetConfig { timer } => {
                assert_eq!(timer.focus_seconds, Some(3000));
                assert_eq!(timer.daily_goal, Some(4));
                assert_eq!(timer.short_break_seconds, None);
            }
            other => panic!("Expected SetConfig, got {:?}", other),
        }
    }

    #[test]
    fn error_response_serialization() {
        let resp = Response::error(3, ErrorInfo::new(ErrorCode::IntentionRequired, "set an intention first"));

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("intention_required"));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, 3);
        assert!(matches!(parsed.result, ResponseResult::Err(_)));
    }

    #[test]
    fn outbound_lines_are_tagged() {
        let line = serde_json::to_string(&Outbound::Response(Response::success(
            4,
            ResponsePayload::Pong,
        )))
        .unwrap();
        assert!(line.contains("\"kind\":\"response\""));

        let parsed: Outbound = serde_json::from_str(&line).unwrap();
        assert!(matches!(parsed, Outbound::Response(r) if r.request_id == 4));
    }
}
