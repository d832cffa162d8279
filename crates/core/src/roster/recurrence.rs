//! Recurring shift generation.
//!
//! A recurrence request describes one shift (start, duration) plus a repeat
//! rule. Expansion produces the concrete occurrences in start order; the caller
//! persists them as ordinary shifts sharing one [`SeriesId`].
//!
//! Occurrence `k` starts at `start + k * unit`, always measured from the first
//! shift. For monthly repeats this means a series anchored on the 31st lands on
//! the last day of shorter months and returns to the 31st afterwards
//! (Jan 31, Feb 28, Mar 31, Apr 30) instead of drifting.
//!
//! Times are wall-clock `NaiveDateTime`; no timezone conversion, holiday
//! skipping or clash detection happens here.

use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use carebase_shared::types::SeriesId;

use super::error::RecurrenceError;

/// Maximum number of shifts one recurrence request may create.
pub const MAX_OCCURRENCES: u32 = 52;

/// Calendar increment between occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatUnit {
    /// Every day.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Fortnightly,
    /// Same day each calendar month, clamped to month end.
    Monthly,
}

impl RepeatUnit {
    /// Returns the anchor shifted by `steps` increments.
    fn advance(self, anchor: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        let days = |per_step: i64| {
            TimeDelta::try_days(per_step * i64::from(steps))
                .and_then(|delta| anchor.checked_add_signed(delta))
        };

        match self {
            Self::Daily => days(1),
            Self::Weekly => days(7),
            Self::Fortnightly => days(14),
            Self::Monthly => anchor.checked_add_months(Months::new(steps)),
        }
    }

    /// Returns the string representation of the unit.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
        }
    }
}

/// When a series stops.
///
/// Exactly one condition applies; the tag selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum RecurrenceEnd {
    /// Stop after a fixed number of shifts (1..=52).
    AfterOccurrences {
        /// Number of shifts to create, including the first.
        count: u32,
    },
    /// Include every shift whose start date is on or before `until`.
    OnDate {
        /// Last date a shift may start on.
        until: NaiveDate,
    },
}

/// A repeat rule attached to a shift definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Calendar increment between shifts.
    pub frequency: RepeatUnit,
    /// Termination condition.
    pub end: RecurrenceEnd,
}

/// One concrete shift produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// Zero-based position in the series.
    pub index: u32,
    /// Start of this shift.
    pub start: NaiveDateTime,
    /// End of this shift (`start + duration`).
    pub end: NaiveDateTime,
}

/// Occurrences generated by one recurrence request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftSeries {
    /// Identifier shared by every occurrence.
    pub series_id: SeriesId,
    /// Occurrences in start order.
    pub occurrences: Vec<Occurrence>,
}

impl ShiftSeries {
    /// Number of occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// Returns true if the series has no occurrences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

/// Expands a rule and tags the result with a fresh series identifier.
///
/// # Errors
///
/// See [`expand`].
pub fn generate(
    start: NaiveDateTime,
    duration: TimeDelta,
    rule: RecurrenceRule,
) -> Result<ShiftSeries, RecurrenceError> {
    let occurrences = expand(start, duration, rule)?;
    Ok(ShiftSeries {
        series_id: SeriesId::new(),
        occurrences,
    })
}

/// Expands a rule into its occurrences.
///
/// # Errors
///
/// - `InvalidDuration` when `duration <= 0`
/// - `InvalidOccurrenceCount` when a count is 0 or above [`MAX_OCCURRENCES`]
/// - `EndBeforeStart` when the end date precedes the first shift
/// - `TooManyOccurrences` when an end date admits more than [`MAX_OCCURRENCES`] shifts
/// - `DateOutOfRange` on calendar overflow
pub fn expand(
    start: NaiveDateTime,
    duration: TimeDelta,
    rule: RecurrenceRule,
) -> Result<Vec<Occurrence>, RecurrenceError> {
    if duration <= TimeDelta::zero() {
        return Err(RecurrenceError::InvalidDuration);
    }

    match rule.end {
        RecurrenceEnd::AfterOccurrences { count } => {
            if count == 0 || count > MAX_OCCURRENCES {
                return Err(RecurrenceError::InvalidOccurrenceCount {
                    count,
                    limit: MAX_OCCURRENCES,
                });
            }
            (0..count)
                .map(|index| occurrence_at(start, duration, rule.frequency, index))
                .collect()
        }
        RecurrenceEnd::OnDate { until } => {
            if until < start.date() {
                return Err(RecurrenceError::EndBeforeStart {
                    until,
                    first: start.date(),
                });
            }

            let mut occurrences = Vec::new();
            let mut index = 0;
            loop {
                let next = occurrence_at(start, duration, rule.frequency, index)?;
                if next.start.date() > until {
                    break;
                }
                if index == MAX_OCCURRENCES {
                    return Err(RecurrenceError::TooManyOccurrences {
                        limit: MAX_OCCURRENCES,
                    });
                }
                occurrences.push(next);
                index += 1;
            }
            Ok(occurrences)
        }
    }
}

fn occurrence_at(
    anchor: NaiveDateTime,
    duration: TimeDelta,
    unit: RepeatUnit,
    index: u32,
) -> Result<Occurrence, RecurrenceError> {
    let start = unit
        .advance(anchor, index)
        .ok_or(RecurrenceError::DateOutOfRange)?;
    let end = start
        .checked_add_signed(duration)
        .ok_or(RecurrenceError::DateOutOfRange)?;

    Ok(Occurrence { index, start, end })
}
