//! Stats accumulation on completed focus sessions

use chrono::{DateTime, Datelike, Local, NaiveDate};
use focus_api::Stats;
use focus_util::{local_day_key, TimeBucket};
use std::collections::HashMap;

use crate::HistoryLedger;

const TOTAL_SESSIONS: &str = "total_sessions";
const TOTAL_FOCUS_MINUTES: &str = "total_focus_minutes";
const COMPLETED_TASKS: &str = "completed_tasks";
const NIGHT_SESSIONS: &str = "night_sessions";
const MORNING_SESSIONS: &str = "morning_sessions";
const LONGEST_SESSION_MINUTES: &str = "longest_session_minutes";
const FOCUS_STREAK_DAYS: &str = "focus_streak_days";
const GOAL_STREAK_DAYS: &str = "goal_streak_days";
const PERFECT_WEEKS: &str = "perfect_weeks";
const DAILY_SESSIONS_COMPLETED: &str = "daily_sessions_completed";
const DAILY_GOAL: &str = "daily_goal";
/// Day the daily goal was last met, as days since 0001-01-01
const GOAL_MET_ON: &str = "goal_met_on";

/// What a focus completion changed beyond the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusAccounting {
    /// Daily goal met for the first time today
    pub goal_reached: bool,
}

/// Owns [`Stats`] and applies the completion pipeline to it
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    stats: Stats,
    goal_met_on: Option<NaiveDate>,
}

impl StatsAccumulator {
    pub fn new(daily_goal: u32) -> Self {
        Self {
            stats: Stats {
                daily_goal: u64::from(daily_goal),
                ..Stats::default()
            },
            goal_met_on: None,
        }
    }

    /// Rebuild from persisted key/value rows. The daily count is re-derived
    /// from the ledger and the goal comes from the active config.
    pub fn from_stored(
        values: &HashMap<String, i64>,
        daily_goal: u32,
        ledger: &HistoryLedger,
        today: NaiveDate,
    ) -> Self {
        let get = |key: &str| values.get(key).copied().unwrap_or(0).max(0) as u64;

        let stats = Stats {
            total_sessions: get(TOTAL_SESSIONS),
            total_focus_minutes: get(TOTAL_FOCUS_MINUTES),
            completed_tasks: get(COMPLETED_TASKS),
            night_sessions: get(NIGHT_SESSIONS),
            morning_sessions: get(MORNING_SESSIONS),
            longest_session_minutes: get(LONGEST_SESSION_MINUTES),
            focus_streak_days: ledger.current_streak(today),
            goal_streak_days: get(GOAL_STREAK_DAYS),
            perfect_weeks: get(PERFECT_WEEKS),
            daily_sessions_completed: u64::from(ledger.count_for(today)),
            daily_goal: u64::from(daily_goal),
        };

        let goal_met_on = values
            .get(GOAL_MET_ON)
            .and_then(|days| i32::try_from(*days).ok())
            .and_then(NaiveDate::from_num_days_from_ce_opt);

        Self { stats, goal_met_on }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Rows to persist
    pub fn to_stored(&self) -> Vec<(&'static str, i64)> {
        let v = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        let mut rows = vec![
            (TOTAL_SESSIONS, v(self.stats.total_sessions)),
            (TOTAL_FOCUS_MINUTES, v(self.stats.total_focus_minutes)),
            (COMPLETED_TASKS, v(self.stats.completed_tasks)),
            (NIGHT_SESSIONS, v(self.stats.night_sessions)),
            (MORNING_SESSIONS, v(self.stats.morning_sessions)),
            (LONGEST_SESSION_MINUTES, v(self.stats.longest_session_minutes)),
            (FOCUS_STREAK_DAYS, v(self.stats.focus_streak_days)),
            (GOAL_STREAK_DAYS, v(self.stats.goal_streak_days)),
            (PERFECT_WEEKS, v(self.stats.perfect_weeks)),
            (DAILY_SESSIONS_COMPLETED, v(self.stats.daily_sessions_completed)),
            (DAILY_GOAL, v(self.stats.daily_goal)),
        ];
        if let Some(day) = self.goal_met_on {
            rows.push((GOAL_MET_ON, i64::from(day.num_days_from_ce())));
        }
        rows
    }

    /// Account one completed focus phase.
    ///
    /// `ledger` must already contain this completion. The new value is built
    /// aside and committed in one assignment.
    pub fn record_focus_completion(
        &mut self,
        planned_seconds: u64,
        completed_at: DateTime<Local>,
        ledger: &HistoryLedger,
    ) -> FocusAccounting {
        let today = local_day_key(&completed_at);
        let today_count = u64::from(ledger.count_for(today));
        let planned_minutes = planned_seconds / 60;

        let mut next = self.stats.clone();
        let mut goal_met_on = self.goal_met_on;
        let mut accounting = FocusAccounting::default();

        next.total_sessions += 1;
        next.daily_sessions_completed = today_count;
        next.total_focus_minutes += planned_minutes;
        next.longest_session_minutes = next.longest_session_minutes.max(planned_minutes);

        match TimeBucket::classify(&completed_at) {
            Some(TimeBucket::Night) => next.night_sessions += 1,
            Some(TimeBucket::Morning) => next.morning_sessions += 1,
            None => {}
        }

        next.focus_streak_days = ledger.compute_streak(today);

        // A zero goal never enters the comparison
        if next.daily_goal > 0 && today_count >= next.daily_goal && goal_met_on != Some(today) {
            goal_met_on = Some(today);
            accounting.goal_reached = true;

            let yesterday_count = today
                .pred_opt()
                .map(|d| u64::from(ledger.count_for(d)))
                .unwrap_or(0);
            // Missed days do not reset the goal streak
            if yesterday_count >= next.daily_goal || next.goal_streak_days == 0 {
                next.goal_streak_days += 1;
            }
        }

        self.stats = next;
        self.goal_met_on = goal_met_on;
        accounting
    }

    /// Re-derive today's count after the local day rolled over
    pub fn refresh_daily(&mut self, ledger: &HistoryLedger, today: NaiveDate) -> bool {
        let count = u64::from(ledger.count_for(today));
        let streak = ledger.current_streak(today);
        if self.stats.daily_sessions_completed == count && self.stats.focus_streak_days == streak {
            return false;
        }
        self.stats.daily_sessions_completed = count;
        self.stats.focus_streak_days = streak;
        true
    }

    pub fn set_daily_goal(&mut self, daily_goal: u32) {
        self.stats.daily_goal = u64::from(daily_goal);
    }

    pub fn record_task_completed(&mut self) {
        self.stats.completed_tasks += 1;
    }

    /// Data reset; the goal is configuration and survives
    pub fn reset(&mut self) {
        *self = Self::new(self.stats.daily_goal.min(u64::from(u32::MAX)) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, hour, 30, 0).single().unwrap()
    }

    /// Record a completion in both ledger and accumulator, like the engine does
    fn complete(
        acc: &mut StatsAccumulator,
        ledger: &mut HistoryLedger,
        planned_seconds: u64,
        when: DateTime<Local>,
    ) -> FocusAccounting {
        ledger.record_focus_completion(local_day_key(&when));
        acc.record_focus_completion(planned_seconds, when, ledger)
    }

    #[test]
    fn test_counters_on_completion() {
        let mut acc = StatsAccumulator::new(8);
        let mut ledger = HistoryLedger::new();

        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        complete(&mut acc, &mut ledger, 3000, at(2024, 5, 14, 11));

        let stats = acc.stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.daily_sessions_completed, 2);
        assert_eq!(stats.total_focus_minutes, 75);
        assert_eq!(stats.longest_session_minutes, 50);
        assert_eq!(stats.focus_streak_days, 1);
        assert_eq!(stats.night_sessions, 0);
        assert_eq!(stats.morning_sessions, 0);
    }

    #[test]
    fn test_minutes_use_planned_duration() {
        let mut acc = StatsAccumulator::new(8);
        let mut ledger = HistoryLedger::new();

        // Skipped with 300s left still credits the full 25 minutes
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        assert_eq!(acc.stats().total_focus_minutes, 25);
    }

    #[test]
    fn test_minutes_are_floored() {
        let mut acc = StatsAccumulator::new(8);
        let mut ledger = HistoryLedger::new();

        complete(&mut acc, &mut ledger, 119, at(2024, 5, 14, 10));
        assert_eq!(acc.stats().total_focus_minutes, 1);
        assert_eq!(acc.stats().longest_session_minutes, 1);
    }

    #[test]
    fn test_time_of_day_buckets() {
        let mut acc = StatsAccumulator::new(0);
        let mut ledger = HistoryLedger::new();

        for hour in [23, 0, 4, 5, 6, 7, 12, 22] {
            complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, hour));
        }

        assert_eq!(acc.stats().night_sessions, 3);
        assert_eq!(acc.stats().morning_sessions, 2);
    }

    #[test]
    fn test_focus_streak_recomputed_from_ledger() {
        let mut ledger = HistoryLedger::from_entries([
            (NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(), 1),
            (NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(), 1),
        ]);
        let mut acc = StatsAccumulator::new(8);

        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        assert_eq!(acc.stats().focus_streak_days, 3);
    }

    #[test]
    fn test_goal_reached_once_per_day() {
        let mut acc = StatsAccumulator::new(2);
        let mut ledger = HistoryLedger::new();

        assert!(!complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 9)).goal_reached);
        assert!(complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10)).goal_reached);
        assert!(!complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 11)).goal_reached);
        assert_eq!(acc.stats().goal_streak_days, 1);

        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 15, 9));
        assert!(complete(&mut acc, &mut ledger, 1500, at(2024, 5, 15, 10)).goal_reached);
        assert_eq!(acc.stats().goal_streak_days, 2);
    }

    #[test]
    fn test_goal_streak_is_not_reset_by_missed_day() {
        let mut acc = StatsAccumulator::new(1);
        let mut ledger = HistoryLedger::new();

        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 13, 10));
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        assert_eq!(acc.stats().goal_streak_days, 2);

        // 05-15 missed entirely; meeting the goal on 05-16 neither resets
        // nor extends the streak
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 16, 10));
        assert_eq!(acc.stats().goal_streak_days, 2);

        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 17, 10));
        assert_eq!(acc.stats().goal_streak_days, 3);
    }

    #[test]
    fn test_zero_goal_never_triggers() {
        let mut acc = StatsAccumulator::new(0);
        let mut ledger = HistoryLedger::new();

        for hour in 8..20 {
            let accounting = complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, hour));
            assert!(!accounting.goal_reached);
        }
        assert_eq!(acc.stats().goal_streak_days, 0);
    }

    #[test]
    fn test_stored_round_trip_keeps_goal_day() {
        let mut acc = StatsAccumulator::new(1);
        let mut ledger = HistoryLedger::new();
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));

        let stored: HashMap<String, i64> = acc
            .to_stored()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let today = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        let mut restored = StatsAccumulator::from_stored(&stored, 1, &ledger, today);
        assert_eq!(restored.stats(), acc.stats());

        // Goal already met today before the restart
        let again = complete(&mut restored, &mut ledger, 1500, at(2024, 5, 14, 11));
        assert!(!again.goal_reached);
        assert_eq!(restored.stats().goal_streak_days, 1);
    }

    #[test]
    fn test_refresh_daily_on_rollover() {
        let mut acc = StatsAccumulator::new(8);
        let mut ledger = HistoryLedger::new();
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        assert_eq!(acc.stats().daily_sessions_completed, 1);

        let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert!(acc.refresh_daily(&ledger, tomorrow));
        assert_eq!(acc.stats().daily_sessions_completed, 0);
        assert_eq!(acc.stats().total_sessions, 1);
        assert!(!acc.refresh_daily(&ledger, tomorrow));
    }

    #[test]
    fn test_refresh_daily_lapses_focus_streak() {
        let mut acc = StatsAccumulator::new(8);
        let mut ledger = HistoryLedger::new();
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));

        let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        acc.refresh_daily(&ledger, tomorrow);
        assert_eq!(acc.stats().focus_streak_days, 1);

        let later = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert!(acc.refresh_daily(&ledger, later));
        assert_eq!(acc.stats().focus_streak_days, 0);
    }

    #[test]
    fn test_reset_keeps_goal() {
        let mut acc = StatsAccumulator::new(5);
        let mut ledger = HistoryLedger::new();
        complete(&mut acc, &mut ledger, 1500, at(2024, 5, 14, 10));
        acc.record_task_completed();

        acc.reset();
        assert_eq!(acc.stats().total_sessions, 0);
        assert_eq!(acc.stats().completed_tasks, 0);
        assert_eq!(acc.stats().daily_goal, 5);
    }
}
