//! Session state machine

use focus_api::{SessionPhase, TimerSnapshot};
use focus_config::TimerConfig;
use focus_util::SessionId;

/// Outcome of a phase reaching zero or being skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCompletion {
    pub session_id: SessionId,
    pub phase: SessionPhase,
    /// Configured duration captured when the phase started
    pub planned_seconds: u64,
    pub actual_seconds: u64,
    /// `false` when skipped
    pub natural: bool,
    pub next_phase: SessionPhase,
}

/// Countdown for the current phase plus round bookkeeping
///
/// Starts in `Focus`, paused, with the full focus duration remaining.
/// `remaining_seconds` never exceeds `phase_total_seconds`.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    config: TimerConfig,
    session_id: SessionId,
    phase: SessionPhase,
    remaining_seconds: u64,
    phase_total_seconds: u64,
    is_running: bool,
    completed_focus_sessions_this_round: u64,
}

impl SessionTimer {
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            config: *config,
            session_id: SessionId::new(),
            phase: SessionPhase::Focus,
            remaining_seconds: config.focus_seconds,
            phase_total_seconds: config.focus_seconds,
            is_running: false,
            completed_focus_sessions_this_round: 0,
        }
    }

    /// Rebuild a timer from a persisted snapshot. Always restored paused.
    pub fn restore(config: &TimerConfig, snapshot: &TimerSnapshot) -> Self {
        let phase_total_seconds = if snapshot.phase_total_seconds > 0 {
            snapshot.phase_total_seconds
        } else {
            config.duration_for(snapshot.phase)
        };
        let remaining_seconds = match snapshot.remaining_seconds.min(phase_total_seconds) {
            0 => phase_total_seconds,
            r => r,
        };

        Self {
            config: *config,
            session_id: snapshot.session_id.clone(),
            phase: snapshot.phase,
            remaining_seconds,
            phase_total_seconds,
            is_running: false,
            completed_focus_sessions_this_round: snapshot.completed_focus_sessions_this_round,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn phase_total_seconds(&self) -> u64 {
        self.phase_total_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_focus_sessions_this_round(&self) -> u64 {
        self.completed_focus_sessions_this_round
    }

    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Advance one second. The call that reaches zero completes the phase.
    pub fn tick(&mut self) -> Option<PhaseCompletion> {
        if !self.is_running {
            return None;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return Some(self.complete_phase(true));
        }
        None
    }

    /// Complete the current phase now, whatever time is left
    pub fn skip(&mut self) -> PhaseCompletion {
        self.complete_phase(false)
    }

    /// Take new durations.
    ///
    /// Only an idle phase (paused with nothing elapsed) whose duration changed
    /// is re-armed. A countdown in progress, running or paused, keeps its
    /// remaining time and the new durations apply from the next phase.
    pub fn apply_config(&mut self, config: &TimerConfig) -> bool {
        self.config = *config;

        let duration = config.duration_for(self.phase);
        let idle = !self.is_running && self.remaining_seconds == self.phase_total_seconds;
        if !idle || duration == self.phase_total_seconds {
            return false;
        }

        self.phase_total_seconds = duration;
        self.remaining_seconds = duration;
        true
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            phase_total_seconds: self.phase_total_seconds,
            is_running: self.is_running,
            completed_focus_sessions_this_round: self.completed_focus_sessions_this_round,
        }
    }

    fn complete_phase(&mut self, natural: bool) -> PhaseCompletion {
        let finished = self.phase;
        let planned_seconds = self.phase_total_seconds;
        let actual_seconds = self.phase_total_seconds - self.remaining_seconds;
        let session_id = self.session_id.clone();

        let next_phase = match finished {
            SessionPhase::Focus => {
                self.completed_focus_sessions_this_round += 1;
                if self.is_long_break_due() {
                    SessionPhase::LongBreak
                } else {
                    SessionPhase::ShortBreak
                }
            }
            SessionPhase::ShortBreak | SessionPhase::LongBreak => SessionPhase::Focus,
        };

        self.enter_phase(next_phase);

        PhaseCompletion {
            session_id,
            phase: finished,
            planned_seconds,
            actual_seconds,
            natural,
            next_phase,
        }
    }

    fn is_long_break_due(&self) -> bool {
        let per_round = u64::from(self.config.sessions_per_round);
        per_round > 0 && self.completed_focus_sessions_this_round % per_round == 0
    }

    fn enter_phase(&mut self, phase: SessionPhase) {
        self.session_id = SessionId::new();
        self.phase = phase;
        self.phase_total_seconds = self.config.duration_for(phase);
        self.remaining_seconds = self.phase_total_seconds;
        // Breaks run on their own; focus waits for an explicit start
        self.is_running = phase.is_break();
    }
}
