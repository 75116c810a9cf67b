//! Session lifecycle engine for focusd
//!
//! This crate is the heart of focusd, containing:
//! - Session state machine (Focus -> ShortBreak/LongBreak -> Focus)
//! - History ledger keyed by local calendar day, with streaks and windows
//! - Stats accumulation on completed focus sessions
//! - Achievement catalog and evaluation
//! - Task linkage for focus sessions

mod achievements;
mod engine;
mod events;
mod ledger;
mod session;
mod stats;
mod tasks;

pub use achievements::*;
pub use engine::*;
pub use events::*;
pub use ledger::*;
pub use session::*;
pub use stats::*;
pub use tasks::*;
