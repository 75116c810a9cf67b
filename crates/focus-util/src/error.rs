//! Error types for focusd

use thiserror::Error;

use crate::TaskId;

/// Core error type for focusd operations
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl FocusError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;
