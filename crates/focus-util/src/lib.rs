//! Shared utilities for focusd
//!
//! This crate provides:
//! - ID types (TaskId, SessionId)
//! - Local clock abstraction and calendar day keys
//! - Time-of-day classification for completed sessions
//! - Error types
//! - Default paths for config, data, and log directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
