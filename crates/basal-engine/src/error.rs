//! Error types for basal reconciliation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BasalError {
    /// Command `index` starts before command `index - 1`.
    #[error("Basal commands must be sorted by start time: command {index} precedes its predecessor")]
    Ordering { index: usize },

    #[error("Daily schedule has no segments")]
    EmptySchedule,

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Duplicate schedule boundary at minute {0}")]
    DuplicateTimeOfDay(u32),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, BasalError>;
