//! Overlap detection for a staff member's roster.
//!
//! Clash checks are advisory. Shift creation never rejects an overlap; the
//! check-clash endpoint calls these functions when a client asks.

use chrono::NaiveDateTime;
use serde::Serialize;

use carebase_shared::types::ShiftId;

use super::error::ShiftError;
use super::lifecycle::ShiftStatus;
use super::recurrence::Occurrence;

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: NaiveDateTime,
    /// Exclusive end.
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `ShiftError::InvalidTimeRange` if `end <= start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ShiftError> {
        super::lifecycle::validate_time_range(start, end)?;
        Ok(Self { start, end })
    }

    /// Returns true if the two ranges share any instant. Touching ends do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<&Occurrence> for TimeRange {
    fn from(occurrence: &Occurrence) -> Self {
        Self {
            start: occurrence.start,
            end: occurrence.end,
        }
    }
}

/// A shift already on a staff member's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedShift {
    /// Shift identifier.
    pub id: ShiftId,
    /// When it runs.
    pub range: TimeRange,
    /// Current status.
    pub status: ShiftStatus,
}

/// A clash between one occurrence of a proposed series and a booked shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesClash {
    /// Index of the proposed occurrence.
    pub occurrence_index: u32,
    /// The booked shift it overlaps.
    pub shift_id: ShiftId,
}

/// Returns booked shifts overlapping `proposed`, in input order.
///
/// Cancelled shifts never clash. `exclude` skips the shift being edited.
#[must_use]
pub fn find_clashes(
    proposed: &TimeRange,
    booked: &[BookedShift],
    exclude: Option<ShiftId>,
) -> Vec<ShiftId> {
    booked
        .iter()
        .filter(|shift| Some(shift.id) != exclude)
        .filter(|shift| shift.status.blocks_roster())
        .filter(|shift| shift.range.overlaps(proposed))
        .map(|shift| shift.id)
        .collect()
}

/// Checks every occurrence of a proposed series against booked shifts.
#[must_use]
pub fn find_series_clashes(occurrences: &[Occurrence], booked: &[BookedShift]) -> Vec<SeriesClash> {
    occurrences
        .iter()
        .flat_map(|occurrence| {
            find_clashes(&TimeRange::from(occurrence), booked, None)
                .into_iter()
                .map(|shift_id| SeriesClash {
                    occurrence_index: occurrence.index,
                    shift_id,
                })
        })
        .collect()
}
