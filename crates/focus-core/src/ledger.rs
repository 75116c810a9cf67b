//! History ledger: completed focus sessions per local calendar day

use chrono::{Datelike, NaiveDate};
use focus_api::DayCount;
use std::collections::BTreeMap;

/// Completed focus session counts keyed by local day
///
/// Counts only grow, except through [`HistoryLedger::clear`]. Streaks are
/// always derived from here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLedger {
    days: BTreeMap<NaiveDate, u32>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted rows; duplicate days are summed
    pub fn from_entries(entries: impl IntoIterator<Item = (NaiveDate, u32)>) -> Self {
        let mut ledger = Self::new();
        for (day, count) in entries {
            let slot = ledger.days.entry(day).or_insert(0);
            *slot = slot.saturating_add(count);
        }
        ledger
    }

    /// Add one completion to `day`, returning the day's new count
    pub fn record_focus_completion(&mut self, day: NaiveDate) -> u32 {
        let slot = self.days.entry(day).or_insert(0);
        *slot = slot.saturating_add(1);
        *slot
    }

    pub fn count_for(&self, day: NaiveDate) -> u32 {
        self.days.get(&day).copied().unwrap_or(0)
    }

    /// Consecutive days with at least one completion, ending at `reference`.
    /// Zero when `reference` itself has none.
    pub fn compute_streak(&self, reference: NaiveDate) -> u64 {
        let mut streak = 0;
        let mut day = Some(reference);

        while let Some(d) = day {
            if self.count_for(d) == 0 {
                break;
            }
            streak += 1;
            day = d.pred_opt();
        }

        streak
    }

    /// Streak as seen during `today`: a run that ended yesterday is still
    /// alive until today passes without a completion.
    pub fn current_streak(&self, today: NaiveDate) -> u64 {
        if self.count_for(today) > 0 {
            return self.compute_streak(today);
        }
        today.pred_opt().map_or(0, |yesterday| self.compute_streak(yesterday))
    }

    /// The seven days ending at `reference`, oldest first
    pub fn weekly_window(&self, reference: NaiveDate) -> [DayCount; 7] {
        std::array::from_fn(|i| {
            let back = (6 - i) as u64;
            let day = reference
                .checked_sub_days(chrono::Days::new(back))
                .unwrap_or(reference);
            DayCount {
                day,
                count: self.count_for(day),
                is_today: back == 0,
            }
        })
    }

    /// Sum of completions within a calendar month
    pub fn monthly_total(&self, year: i32, month: u32) -> u64 {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return 0;
        };

        self.days
            .range(first..)
            .take_while(|(day, _)| day.month() == month && day.year() == year)
            .map(|(_, count)| u64::from(*count))
            .sum()
    }

    /// Every day of the month containing `reference`, first day first
    pub fn month_window(&self, reference: NaiveDate) -> Vec<DayCount> {
        let mut window = Vec::with_capacity(31);
        let mut day = reference.with_day(1);

        while let Some(d) = day {
            if d.month() != reference.month() {
                break;
            }
            window.push(DayCount {
                day: d,
                count: self.count_for(d),
                is_today: d == reference,
            });
            day = d.succ_opt();
        }

        window
    }

    /// Recorded days in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.days.iter().map(|(day, count)| (*day, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Data reset
    pub fn clear(&mut self) {
        self.days.clear();
    }
}
