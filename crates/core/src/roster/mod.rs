//! Rostering: recurring shift generation, shift lifecycle and clash detection.
//!
//! # Modules
//!
//! - `recurrence` - Expands one shift definition into a bounded series
//! - `lifecycle` - Shift status state machine and assignment rules
//! - `clash` - Overlap detection against a staff member's booked shifts
//! - `error` - Roster error types

pub mod clash;
pub mod error;
pub mod lifecycle;
pub mod recurrence;

#[cfg(test)]
mod recurrence_props;
#[cfg(test)]
mod tests;

pub use clash::{BookedShift, SeriesClash, TimeRange, find_clashes, find_series_clashes};
pub use error::{RecurrenceError, ShiftError};
pub use lifecycle::{ShiftLifecycle, ShiftStatus, validate_time_range};
pub use recurrence::{
    MAX_OCCURRENCES, Occurrence, RecurrenceEnd, RecurrenceRule, RepeatUnit, ShiftSeries, expand,
    generate,
};
