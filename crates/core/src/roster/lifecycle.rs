//! Shift status state machine.
//!
//! Valid transitions:
//! - Unassigned → Requested (a support worker asks for the shift)
//! - Unassigned → Assigned
//! - Requested → Assigned (request approved) or → Unassigned (declined)
//! - Assigned → Unassigned (assignee removed) or → InProgress (shift started)
//! - InProgress → Completed
//! - any non-terminal status → Cancelled
//!
//! Completed and Cancelled are terminal. Shifts are never deleted; cancelling
//! is the soft removal.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::ShiftError;

/// Status of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Open shift with nobody assigned.
    Unassigned,
    /// A staff member has asked to work this shift.
    Requested,
    /// A staff member is rostered on.
    Assigned,
    /// The shift has started.
    InProgress,
    /// The shift has finished.
    Completed,
    /// The shift will not go ahead.
    Cancelled,
}

impl ShiftStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Requested => "requested",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unassigned" => Some(Self::Unassigned),
            "requested" => Some(Self::Requested),
            "assigned" => Some(Self::Assigned),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if the shift occupies the assignee's time.
    #[must_use]
    pub const fn blocks_roster(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Returns true if `self → to` is an allowed transition.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        use ShiftStatus::{Assigned, Cancelled, Completed, InProgress, Requested, Unassigned};

        match (*self, to) {
            (Unassigned, Requested | Assigned)
            | (Requested, Assigned | Unassigned)
            | (Assigned, Unassigned | InProgress)
            | (InProgress, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless lifecycle rules.
pub struct ShiftLifecycle;

impl ShiftLifecycle {
    /// Validates a status change.
    ///
    /// # Errors
    ///
    /// Returns `ShiftError::InvalidTransition` when the move is not allowed.
    pub fn transition(from: ShiftStatus, to: ShiftStatus) -> Result<ShiftStatus, ShiftError> {
        if from.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ShiftError::InvalidTransition { from, to })
        }
    }

    /// Status implied by setting (`true`) or clearing (`false`) the assignee.
    ///
    /// Re-assigning an assigned shift to someone else keeps it `Assigned`.
    ///
    /// # Errors
    ///
    /// Returns `ShiftError::AssignmentLocked` once the shift is in progress,
    /// completed or cancelled.
    pub fn status_for_assignment(
        current: ShiftStatus,
        has_assignee: bool,
    ) -> Result<ShiftStatus, ShiftError> {
        match current {
            ShiftStatus::InProgress | ShiftStatus::Completed | ShiftStatus::Cancelled => {
                Err(ShiftError::AssignmentLocked(current))
            }
            _ if has_assignee => Ok(ShiftStatus::Assigned),
            _ => Ok(ShiftStatus::Unassigned),
        }
    }

    /// Initial status of a new shift.
    #[must_use]
    pub const fn initial_status(has_assignee: bool) -> ShiftStatus {
        if has_assignee {
            ShiftStatus::Assigned
        } else {
            ShiftStatus::Unassigned
        }
    }
}

/// Rejects shifts whose end is not after their start.
///
/// # Errors
///
/// Returns `ShiftError::InvalidTimeRange`.
pub fn validate_time_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ShiftError> {
    if end <= start {
        return Err(ShiftError::InvalidTimeRange);
    }
    Ok(())
}
