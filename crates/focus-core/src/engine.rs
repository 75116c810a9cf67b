//! Session lifecycle engine

use chrono::NaiveDate;
use focus_api::{AchievementView, DayCount, EngineStateSnapshot, Stats, Task, TimerSnapshot, API_VERSION};
use focus_config::TimerConfig;
use focus_store::{AuditEvent, AuditEventType, StateSnapshot, Store, StoreResult};
use focus_util::{local_day_key, Clock, FocusError, TaskId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    achievements, CoreEvent, HistoryLedger, PhaseCompletion, SessionTimer, StatsAccumulator,
    TaskLinkage,
};

/// Start decision from the engine
#[derive(Debug)]
pub enum StartDecision {
    Started(Vec<CoreEvent>),
    AlreadyRunning,
    /// Focus needs an intention before it can run
    IntentionRequired,
}

/// Log a failed write and carry on; in-memory state stays authoritative
fn logged<T>(what: &'static str, result: StoreResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, what, "Persistence failed");
            None
        }
    }
}

/// The session lifecycle engine
pub struct SessionEngine {
    config: TimerConfig,
    timer: SessionTimer,
    ledger: HistoryLedger,
    stats: StatsAccumulator,
    unlocked: BTreeSet<String>,
    tasks: TaskLinkage,
    intention: Option<String>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    current_day: NaiveDate,
}

impl SessionEngine {
    /// Create an engine, loading history, stats, achievements and the last
    /// timer snapshot from the store
    pub fn new(config: TimerConfig, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let today = local_day_key(&clock.now());

        let ledger = HistoryLedger::from_entries(
            logged("load history", store.load_history()).unwrap_or_default(),
        );
        let stored_stats = logged("load stats", store.load_stats()).unwrap_or_default();
        let stats = StatsAccumulator::from_stored(&stored_stats, config.daily_goal, &ledger, today);
        let unlocked: BTreeSet<String> =
            logged("load achievements", store.load_unlocked_achievements())
                .unwrap_or_default()
                .into_iter()
                .collect();

        let snapshot = logged("load snapshot", store.load_snapshot()).flatten();
        let (timer, intention, tasks) = match snapshot {
            Some(snapshot) => {
                debug!(
                    phase = %snapshot.timer.phase,
                    remaining_secs = snapshot.timer.remaining_seconds,
                    "Restoring timer from snapshot"
                );
                (
                    SessionTimer::restore(&config, &snapshot.timer),
                    snapshot.intention,
                    TaskLinkage::new(snapshot.linked_task),
                )
            }
            None => (SessionTimer::new(&config), None, TaskLinkage::default()),
        };

        info!(
            total_sessions = stats.stats().total_sessions,
            history_days = ledger.iter().count(),
            unlocked = unlocked.len(),
            "Session engine initialized"
        );

        Self {
            config,
            timer,
            ledger,
            stats,
            unlocked,
            tasks,
            intention,
            store,
            clock,
            current_day: today,
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn intention(&self) -> Option<&str> {
        self.intention.as_deref()
    }

    pub fn linked_task(&self) -> Option<&TaskId> {
        self.tasks.linked()
    }

    pub fn unlocked_achievements(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    fn today(&self) -> NaiveDate {
        local_day_key(&self.clock.now())
    }

    /// Start or resume the countdown
    pub fn start(&mut self) -> StartDecision {
        self.roll_day();

        if self.timer.is_running() {
            return StartDecision::AlreadyRunning;
        }

        if self.config.require_intention
            && !self.timer.phase().is_break()
            && self.intention.is_none()
        {
            info!("Start refused: intention required");
            return StartDecision::IntentionRequired;
        }

        self.timer.start();
        self.save_snapshot();

        info!(
            session_id = %self.timer.session_id(),
            phase = %self.timer.phase(),
            remaining_secs = self.timer.remaining_seconds(),
            "Timer started"
        );

        StartDecision::Started(vec![CoreEvent::TimerStarted {
            session_id: self.timer.session_id().clone(),
            phase: self.timer.phase(),
            remaining_seconds: self.timer.remaining_seconds(),
        }])
    }

    /// Stop future ticks. Pausing a paused timer does nothing.
    pub fn pause(&mut self) -> Vec<CoreEvent> {
        if !self.timer.is_running() {
            return Vec::new();
        }

        self.timer.pause();
        self.save_snapshot();

        info!(
            session_id = %self.timer.session_id(),
            remaining_secs = self.timer.remaining_seconds(),
            "Timer paused"
        );

        vec![CoreEvent::TimerPaused {
            session_id: self.timer.session_id().clone(),
            phase: self.timer.phase(),
            remaining_seconds: self.timer.remaining_seconds(),
        }]
    }

    /// Complete the current phase immediately
    pub fn skip(&mut self) -> Vec<CoreEvent> {
        self.roll_day();
        let completion = self.timer.skip();
        self.handle_completion(completion)
    }

    /// One second elapsed
    pub fn tick(&mut self) -> Vec<CoreEvent> {
        self.roll_day();
        match self.timer.tick() {
            Some(completion) => self.handle_completion(completion),
            None => Vec::new(),
        }
    }

    /// Replace the timer configuration. Invalid configs are rejected and
    /// the previous one stays in effect.
    pub fn set_config(&mut self, config: TimerConfig) -> Result<Vec<CoreEvent>, FocusError> {
        let errors = config.validate();
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(errors = %message, "Rejected timer config");
            return Err(FocusError::config(message));
        }

        self.config = config;
        let reset = self.timer.apply_config(&config);
        self.stats.set_daily_goal(config.daily_goal);
        logged("save stats", self.store.save_stats(&self.stats.to_stored()));
        logged(
            "append audit",
            self.store.append_audit(AuditEvent::at(
                self.clock.now(),
                AuditEventType::ConfigChanged {
                    focus_seconds: config.focus_seconds,
                    short_break_seconds: config.short_break_seconds,
                    long_break_seconds: config.long_break_seconds,
                    sessions_per_round: config.sessions_per_round,
                    daily_goal: config.daily_goal,
                },
            )),
        );

        info!(
            focus_secs = config.focus_seconds,
            short_break_secs = config.short_break_seconds,
            long_break_secs = config.long_break_seconds,
            sessions_per_round = config.sessions_per_round,
            daily_goal = config.daily_goal,
            "Timer config updated"
        );

        let mut events = vec![CoreEvent::ConfigChanged(config)];
        if reset {
            self.save_snapshot();
            events.push(self.phase_changed());
        }
        Ok(events)
    }

    /// Link the next focus completion to a task, or clear the link
    pub fn link_task(&mut self, task_id: Option<TaskId>) -> Result<(), FocusError> {
        if let Some(id) = &task_id {
            match self.store.get_task(id) {
                Ok(Some(_)) => {}
                Ok(None) => return Err(FocusError::TaskNotFound(id.clone())),
                Err(e) => warn!(task_id = %id, error = %e, "Could not verify task, linking anyway"),
            }
        }

        debug!(task_id = ?task_id, "Task linked");
        self.tasks.link(task_id);
        self.save_snapshot();
        Ok(())
    }

    /// Set the intention for the upcoming focus session; blank clears it
    pub fn set_intention(&mut self, text: Option<String>) {
        self.intention = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        debug!(intention = ?self.intention, "Intention set");
        self.save_snapshot();
    }

    pub fn add_task(&mut self, title: &str) -> Result<Task, FocusError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FocusError::validation("task title must not be empty"));
        }

        let task = Task {
            id: TaskId::generate(),
            title: title.to_string(),
            completed_sessions: 0,
            completed: false,
            created_at: self.clock.now(),
        };
        self.store.create_task(&task)?;
        logged(
            "append audit",
            self.store.append_audit(AuditEvent::at(
                task.created_at,
                AuditEventType::TaskCreated {
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                },
            )),
        );

        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Mark a task done. Counts towards `completed_tasks` once per task.
    pub fn complete_task(&mut self, task_id: &TaskId) -> Result<(Task, Vec<CoreEvent>), FocusError> {
        if self.store.get_task(task_id)?.is_none() {
            return Err(FocusError::TaskNotFound(task_id.clone()));
        }

        let mut events = Vec::new();
        if self.store.mark_task_completed(task_id)? {
            self.stats.record_task_completed();
            logged("save stats", self.store.save_stats(&self.stats.to_stored()));
            logged(
                "append audit",
                self.store.append_audit(AuditEvent::at(
                    self.clock.now(),
                    AuditEventType::TaskCompleted {
                        task_id: task_id.clone(),
                    },
                )),
            );
            info!(task_id = %task_id, completed_tasks = self.stats.stats().completed_tasks, "Task completed");
            events.extend(self.unlock_achievements());
        }

        if self.tasks.unlink_if(task_id) {
            self.save_snapshot();
        }

        let task = self
            .store
            .get_task(task_id)?
            .ok_or_else(|| FocusError::TaskNotFound(task_id.clone()))?;
        Ok((task, events))
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, FocusError> {
        Ok(self.store.list_tasks()?)
    }

    /// Current stats, with today's count and the focus streak taken from
    /// the ledger
    pub fn stats(&self) -> Stats {
        let today = self.today();
        let mut stats = self.stats.stats().clone();
        stats.daily_sessions_completed = u64::from(self.ledger.count_for(today));
        stats.focus_streak_days = self.ledger.current_streak(today);
        stats
    }

    pub fn timer(&self) -> TimerSnapshot {
        self.timer.snapshot()
    }

    pub fn snapshot(&self) -> EngineStateSnapshot {
        EngineStateSnapshot {
            api_version: API_VERSION,
            timer: self.timer.snapshot(),
            stats: self.stats(),
            intention: self.intention.clone(),
            linked_task: self.tasks.linked().cloned(),
            unlocked_achievements: self.unlocked.iter().cloned().collect(),
        }
    }

    pub fn weekly_window(&self) -> [DayCount; 7] {
        self.ledger.weekly_window(self.today())
    }

    pub fn month_window(&self) -> Vec<DayCount> {
        self.ledger.month_window(self.today())
    }

    /// Whole catalog with progress and unlocked flags
    pub fn achievements(&self) -> Vec<AchievementView> {
        let stats = self.stats();
        achievements::catalog()
            .iter()
            .map(|a| a.view(&stats, self.unlocked.contains(a.id)))
            .collect()
    }

    /// Wipe history, stats and unlocked achievements. The timer and config
    /// are kept.
    pub fn reset_progress(&mut self) -> Vec<CoreEvent> {
        self.ledger.clear();
        self.stats.reset();
        self.unlocked.clear();

        logged("reset progress", self.store.reset_progress());
        logged(
            "append audit",
            self.store
                .append_audit(AuditEvent::at(self.clock.now(), AuditEventType::ProgressReset)),
        );

        info!("Progress reset");
        vec![CoreEvent::ProgressReset]
    }

    /// Save the timer snapshot used for recovery on restart
    pub fn save_snapshot(&self) {
        let snapshot = StateSnapshot {
            timestamp: self.clock.now(),
            timer: self.timer.snapshot(),
            intention: self.intention.clone(),
            linked_task: self.tasks.linked().cloned(),
        };
        logged("save snapshot", self.store.save_snapshot(&snapshot));
    }

    fn roll_day(&mut self) {
        let today = self.today();
        if today == self.current_day {
            return;
        }

        self.current_day = today;
        if self.stats.refresh_daily(&self.ledger, today) {
            logged("save stats", self.store.save_stats(&self.stats.to_stored()));
        }
        info!(day = %today, "Local day rolled over");
    }

    fn phase_changed(&self) -> CoreEvent {
        CoreEvent::PhaseChanged {
            session_id: self.timer.session_id().clone(),
            phase: self.timer.phase(),
            remaining_seconds: self.timer.remaining_seconds(),
            is_running: self.timer.is_running(),
        }
    }

    /// Run the completion pipeline for one finished phase
    fn handle_completion(&mut self, completion: PhaseCompletion) -> Vec<CoreEvent> {
        let now = self.clock.now();
        let is_focus = !completion.phase.is_break();
        let linked_task = if is_focus { self.tasks.linked().cloned() } else { None };
        let intention = if is_focus { self.intention.take() } else { None };

        info!(
            session_id = %completion.session_id,
            phase = %completion.phase,
            natural = completion.natural,
            actual_secs = completion.actual_seconds,
            next_phase = %completion.next_phase,
            "Phase completed"
        );

        logged(
            "append audit",
            self.store.append_audit(AuditEvent::at(
                now,
                AuditEventType::SessionCompleted {
                    session_id: completion.session_id.clone(),
                    phase: completion.phase,
                    planned_seconds: completion.planned_seconds,
                    actual_seconds: completion.actual_seconds,
                    natural: completion.natural,
                    linked_task: linked_task.clone(),
                },
            )),
        );

        let mut events = vec![CoreEvent::SessionCompleted {
            session_id: completion.session_id,
            phase: completion.phase,
            planned_seconds: completion.planned_seconds,
            actual_seconds: completion.actual_seconds,
            natural: completion.natural,
            linked_task,
            intention,
        }];

        if is_focus {
            let day = local_day_key(&now);
            self.ledger.record_focus_completion(day);
            logged("increment history", self.store.increment_day(day));

            let accounting =
                self.stats
                    .record_focus_completion(completion.planned_seconds, now, &self.ledger);
            self.tasks.credit_completion(self.store.as_ref());
            logged("save stats", self.store.save_stats(&self.stats.to_stored()));

            let stats = self.stats.stats();
            debug!(
                total_sessions = stats.total_sessions,
                daily = stats.daily_sessions_completed,
                streak = stats.focus_streak_days,
                "Focus completion accounted"
            );

            if accounting.goal_reached {
                info!(
                    daily_goal = stats.daily_goal,
                    goal_streak_days = stats.goal_streak_days,
                    "Daily goal reached"
                );
                events.push(CoreEvent::DailyGoalReached {
                    daily_goal: stats.daily_goal,
                    goal_streak_days: stats.goal_streak_days,
                });
            }

            events.extend(self.unlock_achievements());
        }

        events.push(self.phase_changed());
        self.save_snapshot();
        events
    }

    /// Evaluate the catalog, record anything new and celebrate the first
    fn unlock_achievements(&mut self) -> Vec<CoreEvent> {
        let newly = achievements::evaluate(self.stats.stats(), &self.unlocked);
        if newly.is_empty() {
            return Vec::new();
        }

        let ids: Vec<String> = newly.iter().map(|a| a.id.to_string()).collect();
        self.unlocked.extend(ids.iter().cloned());
        logged(
            "save achievements",
            self.store.add_unlocked_achievements(&ids, self.clock.now()),
        );

        newly
            .iter()
            .enumerate()
            .map(|(i, a)| {
                logged(
                    "append audit",
                    self.store.append_audit(AuditEvent::at(
                        self.clock.now(),
                        AuditEventType::AchievementUnlocked {
                            id: a.id.to_string(),
                        },
                    )),
                );
                info!(achievement = a.id, "Achievement unlocked");
                CoreEvent::AchievementUnlocked {
                    id: a.id.to_string(),
                    title: a.title.to_string(),
                    icon: a.icon.to_api(),
                    celebrate: i == 0,
                }
            })
            .collect()
    }
}
