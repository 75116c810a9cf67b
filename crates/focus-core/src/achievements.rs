//! Achievement catalog and evaluation

use focus_api::{AchievementIcon, AchievementView, Progress, Stats};
use std::collections::BTreeSet;

/// Stat an achievement is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalSessions,
    TotalFocusMinutes,
    NightSessions,
    MorningSessions,
    FocusStreakDays,
    GoalStreakDays,
    CompletedTasks,
    LongestSessionMinutes,
    PerfectWeeks,
}

impl Metric {
    pub fn value(&self, stats: &Stats) -> u64 {
        match self {
            Metric::TotalSessions => stats.total_sessions,
            Metric::TotalFocusMinutes => stats.total_focus_minutes,
            Metric::NightSessions => stats.night_sessions,
            Metric::MorningSessions => stats.morning_sessions,
            Metric::FocusStreakDays => stats.focus_streak_days,
            Metric::GoalStreakDays => stats.goal_streak_days,
            Metric::CompletedTasks => stats.completed_tasks,
            Metric::LongestSessionMinutes => stats.longest_session_minutes,
            Metric::PerfectWeeks => stats.perfect_weeks,
        }
    }
}

/// Icon reference in the static catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Emoji(&'static str),
    Component(&'static str),
}

impl Icon {
    pub fn to_api(self) -> AchievementIcon {
        match self {
            Icon::Emoji(e) => AchievementIcon::Emoji(e.to_string()),
            Icon::Component(c) => AchievementIcon::Component(c.to_string()),
        }
    }
}

/// Static catalog entry. Unlocked once `metric` reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: Icon,
    pub metric: Metric,
    pub threshold: u64,
}

impl Achievement {
    pub fn is_unlocked_by(&self, stats: &Stats) -> bool {
        self.metric.value(stats) >= self.threshold
    }

    pub fn progress(&self, stats: &Stats) -> Progress {
        Progress::new(self.metric.value(stats), self.threshold)
    }

    pub fn view(&self, stats: &Stats, unlocked: bool) -> AchievementView {
        AchievementView {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_api(),
            unlocked,
            progress: self.progress(stats),
        }
    }
}

const fn entry(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: Icon,
    metric: Metric,
    threshold: u64,
) -> Achievement {
    Achievement {
        id,
        title,
        description,
        icon,
        metric,
        threshold,
    }
}

/// Catalog order is the reporting order when several unlock together
pub const CATALOG: &[Achievement] = &[
    entry("first_focus", "First Focus", "Complete your first focus session", Icon::Emoji("🌱"), Metric::TotalSessions, 1),
    entry("getting_started", "Getting Started", "Complete 10 focus sessions", Icon::Emoji("🚀"), Metric::TotalSessions, 10),
    entry("focused_fifty", "Focused Fifty", "Complete 50 focus sessions", Icon::Emoji("🎯"), Metric::TotalSessions, 50),
    entry("centurion", "Centurion", "Complete 100 focus sessions", Icon::Emoji("💯"), Metric::TotalSessions, 100),
    entry("deep_worker", "Deep Worker", "Complete 500 focus sessions", Icon::Component("trophy"), Metric::TotalSessions, 500),
    entry("hour_of_focus", "Hour of Focus", "Focus for 60 minutes in total", Icon::Emoji("⏱️"), Metric::TotalFocusMinutes, 60),
    entry("ten_hours", "Ten Hours", "Focus for 10 hours in total", Icon::Emoji("⌛"), Metric::TotalFocusMinutes, 600),
    entry("hundred_hours", "Hundred Hours", "Focus for 100 hours in total", Icon::Component("hourglass"), Metric::TotalFocusMinutes, 6000),
    entry("night_owl", "Night Owl", "Complete 10 sessions between 23:00 and 05:00", Icon::Emoji("🦉"), Metric::NightSessions, 10),
    entry("early_bird", "Early Bird", "Complete 10 sessions between 05:00 and 07:00", Icon::Emoji("🐦"), Metric::MorningSessions, 10),
    entry("streak_3", "On a Roll", "Focus 3 days in a row", Icon::Emoji("🔥"), Metric::FocusStreakDays, 3),
    entry("streak_7", "Week Warrior", "Focus 7 days in a row", Icon::Emoji("⚡"), Metric::FocusStreakDays, 7),
    entry("streak_30", "Unstoppable", "Focus 30 days in a row", Icon::Component("flame"), Metric::FocusStreakDays, 30),
    entry("goal_getter", "Goal Getter", "Reach your daily goal", Icon::Emoji("✅"), Metric::GoalStreakDays, 1),
    entry("goal_week", "Goal Week", "Reach your daily goal 7 days in a row", Icon::Emoji("🏅"), Metric::GoalStreakDays, 7),
    entry("task_finisher", "Task Finisher", "Complete 10 tasks", Icon::Emoji("📋"), Metric::CompletedTasks, 10),
    entry("task_master", "Task Master", "Complete 50 tasks", Icon::Component("checklist"), Metric::CompletedTasks, 50),
    entry("marathon", "Marathon", "Complete a focus session of 60 minutes or more", Icon::Emoji("🏃"), Metric::LongestSessionMinutes, 60),
    entry("perfect_week", "Perfect Week", "Have a perfect week", Icon::Emoji("🌟"), Metric::PerfectWeeks, 1),
];

pub fn catalog() -> &'static [Achievement] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Achievements whose condition holds but are not yet unlocked, in catalog order
pub fn evaluate(stats: &Stats, already_unlocked: &BTreeSet<String>) -> Vec<&'static Achievement> {
    CATALOG
        .iter()
        .filter(|a| !already_unlocked.contains(a.id))
        .filter(|a| a.is_unlocked_by(stats))
        .collect()
}

/// Progress projection for near-miss display
pub fn progress(achievement: &Achievement, stats: &Stats) -> Progress {
    achievement.progress(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: BTreeSet<_> = CATALOG.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
        assert!(CATALOG.iter().all(|a| a.threshold > 0));
    }

    #[test]
    fn test_nothing_unlocked_by_default() {
        assert!(evaluate(&Stats::default(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_evaluate_in_catalog_order() {
        let stats = Stats {
            total_sessions: 10,
            total_focus_minutes: 250,
            longest_session_minutes: 60,
            ..Stats::default()
        };

        let ids: Vec<_> = evaluate(&stats, &BTreeSet::new())
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["first_focus", "getting_started", "hour_of_focus", "marathon"]);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let stats = Stats {
            total_sessions: 1,
            ..Stats::default()
        };
        let mut unlocked = BTreeSet::new();

        let first = evaluate(&stats, &unlocked);
        assert_eq!(first.len(), 1);
        unlocked.extend(first.iter().map(|a| a.id.to_string()));

        assert!(evaluate(&stats, &unlocked).is_empty());
    }

    #[test]
    fn test_progress_is_clamped() {
        let stats = Stats {
            total_sessions: 7,
            ..Stats::default()
        };

        let p = progress(find("getting_started").unwrap(), &stats);
        assert_eq!(p.current, 7);
        assert_eq!(p.total, 10);
        assert!((p.percentage - 70.0).abs() < 1e-9);

        let done = progress(find("first_focus").unwrap(), &stats);
        assert!((done.percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_week_needs_external_input() {
        let stats = Stats {
            perfect_weeks: 1,
            ..Stats::default()
        };
        let ids: Vec<_> = evaluate(&stats, &BTreeSet::new())
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["perfect_week"]);
    }

    #[test]
    fn test_view_carries_icon() {
        let view = find("deep_worker")
            .unwrap()
            .view(&Stats::default(), false);
        assert_eq!(view.icon, AchievementIcon::Component("trophy".into()));
        assert!(!view.unlocked);
        assert_eq!(view.progress.total, 500);
    }
}
