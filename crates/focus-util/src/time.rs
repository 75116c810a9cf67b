//! Time utilities for focusd
//!
//! Every component that touches the history ledger derives its calendar day
//! through [`local_day_key`], so day boundaries always follow the host's local
//! time zone rather than UTC.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `FOCUS_MOCK_TIME` environment variable can be set
//! to override the system time seen by [`SystemClock`]. This is useful for
//! exercising streaks, night/morning buckets and day rollover by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 23:30:00`)
//!
//! Example:
//! ```bash
//! FOCUS_MOCK_TIME="2025-12-25 23:30:00" focusd
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "FOCUS_MOCK_TIME";

/// Format of persisted calendar day keys
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                if let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        "Failed to convert mock time to local timezone"
                    );
                } else {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    );
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Source of local "now" for the engine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Host wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        now()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Convenience constructor from local wall-clock components
    ///
    /// Panics if the components do not name a valid, unambiguous local time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let start = Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid local time");
        Self::new(start)
    }

    pub fn set(&self, to: DateTime<Local>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = *current + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Local calendar day of the given instant
pub fn local_day_key(now: &DateTime<Local>) -> NaiveDate {
    now.date_naive()
}

/// Render a day as its persisted `YYYY-MM-DD` key
pub fn format_day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a persisted `YYYY-MM-DD` key
pub fn parse_day_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).ok()
}

/// Time-of-day bucket a completed focus session is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// 23:00 to 04:59
    Night,
    /// 05:00 to 06:59
    Morning,
}

impl TimeBucket {
    /// Classify a local hour (0-23). Hours outside both buckets yield `None`.
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            23 | 0..=4 => Some(Self::Night),
            5 | 6 => Some(Self::Morning),
            _ => None,
        }
    }

    pub fn classify(at: &DateTime<Local>) -> Option<Self> {
        Self::from_hour(at.hour())
    }
}

/// Format a countdown as `MM:SS` (or `H:MM:SS` past an hour)
pub fn format_countdown(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_day_key_roundtrip() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(format_day_key(day), "2025-03-09");
        assert_eq!(parse_day_key("2025-03-09"), Some(day));
        assert_eq!(parse_day_key("2025/03/09"), None);
    }

    #[test]
    fn test_local_day_key_uses_local_date() {
        // 23:30 local belongs to the same local day, whatever UTC says
        let late = Local.with_ymd_and_hms(2025, 12, 25, 23, 30, 0).unwrap();
        assert_eq!(
            local_day_key(&late),
            NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()
        );
    }

    #[test]
    fn test_time_buckets() {
        assert_eq!(TimeBucket::from_hour(23), Some(TimeBucket::Night));
        assert_eq!(TimeBucket::from_hour(0), Some(TimeBucket::Night));
        assert_eq!(TimeBucket::from_hour(4), Some(TimeBucket::Night));
        assert_eq!(TimeBucket::from_hour(5), Some(TimeBucket::Morning));
        assert_eq!(TimeBucket::from_hour(6), Some(TimeBucket::Morning));
        assert_eq!(TimeBucket::from_hour(7), None);
        assert_eq!(TimeBucket::from_hour(12), None);
        assert_eq!(TimeBucket::from_hour(22), None);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at(2025, 12, 31, 23, 59);
        clock.advance(chrono::Duration::minutes(2));

        let now = clock.now();
        assert_eq!(now.year(), 2026);
        assert_eq!(local_day_key(&now), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(1500), "25:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(3661), "1:01:01");
    }

    #[test]
    fn test_now_returns_time() {
        let t = SystemClock.now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time_format() {
        let valid_formats = ["2025-12-25 14:30:00", "2025-01-01 00:00:00", "2025-12-31 23:59:59"];

        for format_str in &valid_formats {
            let result = NaiveDateTime::parse_from_str(format_str, "%Y-%m-%d %H:%M:%S");
            assert!(result.is_ok(), "Expected '{}' to parse", format_str);
        }

        for format_str in &["2025-12-25", "14:30:00", "2025-12-25T14:30:00", ""] {
            let result = NaiveDateTime::parse_from_str(format_str, "%Y-%m-%d %H:%M:%S");
            assert!(result.is_err(), "Expected '{}' to fail parsing", format_str);
        }
    }
}
