//! Scheduler errors.

use thiserror::Error;

/// Errors produced while scheduling a review.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SrsError {
    /// Quality score outside `0..=5`.
    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(i64),

    /// Review requested for a note that was never promoted.
    #[error("note is not a flashcard")]
    NotAFlashcard,

    /// The next interval does not fit in the supported date range.
    #[error("interval of {interval_days} days cannot be scheduled")]
    ScheduleOverflow { interval_days: f64 },
}
