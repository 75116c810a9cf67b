//! Shared types for focusd
//!
//! This crate defines the stable surface between the engine and its hosts:
//! - Phase, timer and stats types
//! - Commands (requests from clients)
//! - Responses
//! - Events (engine -> clients)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
