//! Roster error types.

use chrono::NaiveDate;
use thiserror::Error;

use super::lifecycle::ShiftStatus;

/// Errors produced while expanding a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    /// Shift duration is zero or negative.
    #[error("Shift duration must be positive")]
    InvalidDuration,

    /// Occurrence count outside `1..=limit`.
    #[error("Occurrence count must be between 1 and {limit}, got {count}")]
    InvalidOccurrenceCount {
        /// Requested count.
        count: u32,
        /// Maximum allowed.
        limit: u32,
    },

    /// End date falls before the first occurrence.
    #[error("Repeat end date {until} is before the first shift on {first}")]
    EndBeforeStart {
        /// Requested end date.
        until: NaiveDate,
        /// Date of the first occurrence.
        first: NaiveDate,
    },

    /// The date bound would produce more occurrences than allowed.
    #[error("Repeat range produces more than {limit} shifts; choose an earlier end date")]
    TooManyOccurrences {
        /// Maximum allowed.
        limit: u32,
    },

    /// Calendar arithmetic left chrono's supported range.
    #[error("Shift date out of supported range")]
    DateOutOfRange,
}

/// Errors produced by shift lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    /// Attempted an invalid status transition.
    #[error("Invalid shift status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ShiftStatus,
        /// The attempted target status.
        to: ShiftStatus,
    },

    /// Assignment cannot change once a shift has started or finished.
    #[error("Cannot change the assignee of a {0} shift")]
    AssignmentLocked(ShiftStatus),

    /// End time is not after start time.
    #[error("Shift end time must be after its start time")]
    InvalidTimeRange,
}
