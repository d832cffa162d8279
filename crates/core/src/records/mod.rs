//! Client records: case notes and care support plans.
//!
//! Both are ordinary tenant-scoped aggregates. The rules here cover the few
//! fields with structure: note categories and tags, plan status and dates.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of tags on one case note.
pub const MAX_TAGS: usize = 20;

/// Maximum length of a single tag, in characters.
pub const MAX_TAG_LEN: usize = 40;

/// Maximum number of goals on one care plan.
pub const MAX_GOALS: usize = 30;

/// Record validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Too many tags after normalisation.
    #[error("A case note may have at most {limit} tags, got {count}")]
    TooManyTags {
        /// Tags supplied.
        count: usize,
        /// Maximum allowed.
        limit: usize,
    },

    /// A tag exceeds the length limit.
    #[error("Tag '{tag}' is longer than {limit} characters")]
    TagTooLong {
        /// The offending tag.
        tag: String,
        /// Maximum length.
        limit: usize,
    },

    /// Too many goals on a plan.
    #[error("A care plan may have at most {limit} goals, got {count}")]
    TooManyGoals {
        /// Goals supplied.
        count: usize,
        /// Maximum allowed.
        limit: usize,
    },

    /// Review date precedes the plan start.
    #[error("Review date {review} is before the plan start date {start}")]
    ReviewBeforeStart {
        /// Plan start date.
        start: NaiveDate,
        /// Requested review date.
        review: NaiveDate,
    },

    /// Attempted an invalid plan status transition.
    #[error("Invalid care plan status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: CarePlanStatus,
        /// The attempted target status.
        to: CarePlanStatus,
    },

    /// The record is archived and read-only.
    #[error("Record is archived")]
    Archived,
}

/// Category of a case note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseNoteCategory {
    /// Everyday observations.
    #[default]
    General,
    /// Progress against plan goals.
    Progress,
    /// Incident report.
    Incident,
    /// Medication-related note.
    Medication,
    /// Behaviour support note.
    Behaviour,
}

impl CaseNoteCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Progress => "progress",
            Self::Incident => "incident",
            Self::Medication => "medication",
            Self::Behaviour => "behaviour",
        }
    }

    /// Parses a category from a string. Accepts the US spelling of behaviour.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" => Some(Self::General),
            "progress" => Some(Self::Progress),
            "incident" => Some(Self::Incident),
            "medication" => Some(Self::Medication),
            "behaviour" | "behavior" => Some(Self::Behaviour),
            _ => None,
        }
    }
}

impl fmt::Display for CaseNoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalises case note tags.
///
/// Trims, lowercases, drops empty tags and removes duplicates keeping the
/// first occurrence.
///
/// # Errors
///
/// Returns `TagTooLong` or `TooManyTags` after normalisation.
pub fn normalize_tags<I, S>(tags: I) -> Result<Vec<String>, RecordError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();

    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if tag.is_empty() || normalized.contains(&tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(RecordError::TagTooLong {
                tag,
                limit: MAX_TAG_LEN,
            });
        }
        normalized.push(tag);
    }

    if normalized.len() > MAX_TAGS {
        return Err(RecordError::TooManyTags {
            count: normalized.len(),
            limit: MAX_TAGS,
        });
    }

    Ok(normalized)
}

/// Trims plan goals and drops blank ones.
///
/// # Errors
///
/// Returns `TooManyGoals` if more than [`MAX_GOALS`] remain.
pub fn normalize_goals<I, S>(goals: I) -> Result<Vec<String>, RecordError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let goals: Vec<String> = goals
        .into_iter()
        .map(|goal| goal.as_ref().trim().to_string())
        .filter(|goal| !goal.is_empty())
        .collect();

    if goals.len() > MAX_GOALS {
        return Err(RecordError::TooManyGoals {
            count: goals.len(),
            limit: MAX_GOALS,
        });
    }
    Ok(goals)
}

/// Status of a care support plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarePlanStatus {
    /// Being written.
    Draft,
    /// In effect.
    Active,
    /// Superseded or ended. Terminal.
    Archived,
}

impl CarePlanStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Validates a status change.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidTransition` when the move is not allowed.
    pub fn transition(self, to: Self) -> Result<Self, RecordError> {
        match (self, to) {
            (Self::Draft, Self::Active | Self::Archived) | (Self::Active, Self::Archived) => Ok(to),
            _ => Err(RecordError::InvalidTransition { from: self, to }),
        }
    }

    /// Returns true if the plan can still be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        !matches!(self, Self::Archived)
    }
}

impl fmt::Display for CarePlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejects a review date before the plan start.
///
/// # Errors
///
/// Returns `RecordError::ReviewBeforeStart`.
pub fn validate_review_date(start: NaiveDate, review: Option<NaiveDate>) -> Result<(), RecordError> {
    match review {
        Some(review) if review < start => Err(RecordError::ReviewBeforeStart { start, review }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["  Falls ", "falls", "", "Night Shift", "MEDS"]).unwrap();
        assert_eq!(tags, vec!["falls", "night shift", "meds"]);
    }

    #[test]
    fn test_normalize_tags_limit_counts_after_dedupe() {
        let mut tags: Vec<String> = (0..MAX_TAGS).map(|i| format!("tag{i}")).collect();
        tags.push("TAG0".to_string());
        assert_eq!(normalize_tags(&tags).unwrap().len(), MAX_TAGS);

        tags.push("one-too-many".to_string());
        assert_eq!(
            normalize_tags(&tags),
            Err(RecordError::TooManyTags {
                count: MAX_TAGS + 1,
                limit: MAX_TAGS
            })
        );
    }

    #[test]
    fn test_tag_too_long() {
        let long = "x".repeat(MAX_TAG_LEN + 1);
        assert!(matches!(
            normalize_tags([long.as_str()]),
            Err(RecordError::TagTooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_goals() {
        let goals = normalize_goals([" Cook a meal weekly ", "", "  "]).unwrap();
        assert_eq!(goals, vec!["Cook a meal weekly"]);
    }

    #[rstest]
    #[case("general", Some(CaseNoteCategory::General))]
    #[case("Incident", Some(CaseNoteCategory::Incident))]
    #[case("behavior", Some(CaseNoteCategory::Behaviour))]
    #[case("shopping", None)]
    fn test_category_parse(#[case] input: &str, #[case] expected: Option<CaseNoteCategory>) {
        assert_eq!(CaseNoteCategory::parse(input), expected);
    }

    #[rstest]
    #[case(CarePlanStatus::Draft, CarePlanStatus::Active, true)]
    #[case(CarePlanStatus::Draft, CarePlanStatus::Archived, true)]
    #[case(CarePlanStatus::Active, CarePlanStatus::Archived, true)]
    #[case(CarePlanStatus::Active, CarePlanStatus::Draft, false)]
    #[case(CarePlanStatus::Archived, CarePlanStatus::Active, false)]
    #[case(CarePlanStatus::Draft, CarePlanStatus::Draft, false)]
    fn test_plan_transitions(
        #[case] from: CarePlanStatus,
        #[case] to: CarePlanStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.transition(to).is_ok(), allowed);
    }

    #[test]
    fn test_review_date() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(validate_review_date(start, None).is_ok());
        assert!(validate_review_date(start, Some(start)).is_ok());
        assert_eq!(
            validate_review_date(start, start.pred_opt()),
            Err(RecordError::ReviewBeforeStart {
                start,
                review: start.pred_opt().unwrap()
            })
        );
    }
}
