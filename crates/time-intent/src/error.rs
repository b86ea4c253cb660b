//! Error types for time-intent operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid week start: {0}")]
    InvalidWeekStart(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Not understood: '{0}'")]
    NotUnderstood(String),
}

pub type Result<T> = std::result::Result<T, IntentError>;
