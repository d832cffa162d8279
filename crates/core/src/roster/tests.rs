use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rstest::rstest;

use carebase_shared::types::ShiftId;

use super::*;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rule(frequency: RepeatUnit, end: RecurrenceEnd) -> RecurrenceRule {
    RecurrenceRule { frequency, end }
}

// ============================================================================
// Recurrence
// ============================================================================

#[test]
fn test_weekly_three_occurrences() {
    let series = generate(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Weekly,
            RecurrenceEnd::AfterOccurrences { count: 3 },
        ),
    )
    .unwrap();

    let spans: Vec<_> = series
        .occurrences
        .iter()
        .map(|o| (o.start, o.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            (at(2025, 1, 6, 9, 0), at(2025, 1, 6, 17, 0)),
            (at(2025, 1, 13, 9, 0), at(2025, 1, 13, 17, 0)),
            (at(2025, 1, 20, 9, 0), at(2025, 1, 20, 17, 0)),
        ]
    );
    assert_eq!(series.len(), 3);
}

#[test]
fn test_each_series_gets_its_own_id() {
    let r = rule(RepeatUnit::Daily, RecurrenceEnd::AfterOccurrences { count: 2 });
    let a = generate(at(2025, 1, 6, 9, 0), TimeDelta::hours(1), r).unwrap();
    let b = generate(at(2025, 1, 6, 9, 0), TimeDelta::hours(1), r).unwrap();
    assert_ne!(a.series_id, b.series_id);
    assert_eq!(a.occurrences, b.occurrences);
}

#[test]
fn test_monthly_clamps_to_month_end_without_drift() {
    let occurrences = expand(
        at(2025, 1, 31, 10, 0),
        TimeDelta::hours(2),
        rule(
            RepeatUnit::Monthly,
            RecurrenceEnd::AfterOccurrences { count: 4 },
        ),
    )
    .unwrap();

    let dates: Vec<_> = occurrences.iter().map(|o| o.start.date()).collect();
    assert_eq!(
        dates,
        vec![
            date(2025, 1, 31),
            date(2025, 2, 28),
            date(2025, 3, 31),
            date(2025, 4, 30),
        ]
    );
}

#[test]
fn test_monthly_leap_year() {
    let occurrences = expand(
        at(2024, 1, 30, 10, 0),
        TimeDelta::hours(2),
        rule(
            RepeatUnit::Monthly,
            RecurrenceEnd::AfterOccurrences { count: 2 },
        ),
    )
    .unwrap();
    assert_eq!(occurrences[1].start.date(), date(2024, 2, 29));
}

#[test]
fn test_overnight_shift_keeps_duration() {
    let occurrences = expand(
        at(2025, 3, 3, 22, 0),
        TimeDelta::hours(10),
        rule(RepeatUnit::Daily, RecurrenceEnd::AfterOccurrences { count: 2 }),
    )
    .unwrap();
    assert_eq!(occurrences[0].end, at(2025, 3, 4, 8, 0));
    assert_eq!(occurrences[1].start, at(2025, 3, 4, 22, 0));
}

#[test]
fn test_until_date_is_inclusive() {
    let occurrences = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Fortnightly,
            RecurrenceEnd::OnDate {
                until: date(2025, 2, 3),
            },
        ),
    )
    .unwrap();

    let dates: Vec<_> = occurrences.iter().map(|o| o.start.date()).collect();
    assert_eq!(
        dates,
        vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 2, 3)]
    );
}

#[test]
fn test_until_same_day_yields_single_shift() {
    let occurrences = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Weekly,
            RecurrenceEnd::OnDate {
                until: date(2025, 1, 6),
            },
        ),
    )
    .unwrap();
    assert_eq!(occurrences.len(), 1);
}

#[rstest]
#[case(0)]
#[case(53)]
fn test_occurrence_count_out_of_bounds(#[case] count: u32) {
    let result = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(RepeatUnit::Daily, RecurrenceEnd::AfterOccurrences { count }),
    );
    assert_eq!(
        result,
        Err(RecurrenceError::InvalidOccurrenceCount {
            count,
            limit: MAX_OCCURRENCES
        })
    );
}

#[test]
fn test_fifty_two_occurrences_allowed() {
    let occurrences = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Weekly,
            RecurrenceEnd::AfterOccurrences { count: 52 },
        ),
    )
    .unwrap();
    assert_eq!(occurrences.len(), 52);
    assert_eq!(occurrences[51].index, 51);
}

#[rstest]
#[case(TimeDelta::zero())]
#[case(TimeDelta::hours(-1))]
fn test_non_positive_duration_rejected(#[case] duration: TimeDelta) {
    let result = expand(
        at(2025, 1, 6, 9, 0),
        duration,
        rule(RepeatUnit::Daily, RecurrenceEnd::AfterOccurrences { count: 1 }),
    );
    assert_eq!(result, Err(RecurrenceError::InvalidDuration));
}

#[test]
fn test_end_before_start_rejected() {
    let result = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Daily,
            RecurrenceEnd::OnDate {
                until: date(2025, 1, 5),
            },
        ),
    );
    assert!(matches!(result, Err(RecurrenceError::EndBeforeStart { .. })));
}

#[test]
fn test_date_bound_over_limit_rejected() {
    let result = expand(
        at(2025, 1, 1, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Daily,
            RecurrenceEnd::OnDate {
                until: date(2025, 12, 31),
            },
        ),
    );
    assert_eq!(
        result,
        Err(RecurrenceError::TooManyOccurrences {
            limit: MAX_OCCURRENCES
        })
    );
}

#[test]
fn test_date_bound_exactly_at_limit() {
    // 52 daily shifts: Jan 1 through Feb 21.
    let occurrences = expand(
        at(2025, 1, 1, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Daily,
            RecurrenceEnd::OnDate {
                until: date(2025, 2, 21),
            },
        ),
    )
    .unwrap();
    assert_eq!(occurrences.len(), 52);
}

#[test]
fn test_recurrence_end_json_shape() {
    let end: RecurrenceEnd =
        serde_json::from_str(r#"{"type":"after_occurrences","count":3}"#).unwrap();
    assert_eq!(end, RecurrenceEnd::AfterOccurrences { count: 3 });

    let end: RecurrenceEnd =
        serde_json::from_str(r#"{"type":"on_date","until":"2025-03-01"}"#).unwrap();
    assert_eq!(
        end,
        RecurrenceEnd::OnDate {
            until: date(2025, 3, 1)
        }
    );
}

#[test]
fn test_recurrence_end_rejects_mixed_conditions() {
    let result: Result<RecurrenceEnd, _> = serde_json::from_str(
        r#"{"type":"after_occurrences","count":3,"until":"2025-03-01"}"#,
    );
    assert!(result.is_err());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[rstest]
#[case(ShiftStatus::Unassigned, ShiftStatus::Requested)]
#[case(ShiftStatus::Unassigned, ShiftStatus::Assigned)]
#[case(ShiftStatus::Requested, ShiftStatus::Assigned)]
#[case(ShiftStatus::Requested, ShiftStatus::Unassigned)]
#[case(ShiftStatus::Assigned, ShiftStatus::InProgress)]
#[case(ShiftStatus::Assigned, ShiftStatus::Unassigned)]
#[case(ShiftStatus::InProgress, ShiftStatus::Completed)]
#[case(ShiftStatus::Unassigned, ShiftStatus::Cancelled)]
#[case(ShiftStatus::InProgress, ShiftStatus::Cancelled)]
fn test_valid_transitions(#[case] from: ShiftStatus, #[case] to: ShiftStatus) {
    assert_eq!(ShiftLifecycle::transition(from, to), Ok(to));
}

#[rstest]
#[case(ShiftStatus::Unassigned, ShiftStatus::Completed)]
#[case(ShiftStatus::Requested, ShiftStatus::InProgress)]
#[case(ShiftStatus::Completed, ShiftStatus::Cancelled)]
#[case(ShiftStatus::Cancelled, ShiftStatus::Assigned)]
#[case(ShiftStatus::Completed, ShiftStatus::InProgress)]
#[case(ShiftStatus::Assigned, ShiftStatus::Assigned)]
fn test_invalid_transitions(#[case] from: ShiftStatus, #[case] to: ShiftStatus) {
    assert_eq!(
        ShiftLifecycle::transition(from, to),
        Err(ShiftError::InvalidTransition { from, to })
    );
}

#[test]
fn test_assignment_status() {
    assert_eq!(
        ShiftLifecycle::status_for_assignment(ShiftStatus::Unassigned, true),
        Ok(ShiftStatus::Assigned)
    );
    assert_eq!(
        ShiftLifecycle::status_for_assignment(ShiftStatus::Requested, true),
        Ok(ShiftStatus::Assigned)
    );
    assert_eq!(
        ShiftLifecycle::status_for_assignment(ShiftStatus::Assigned, false),
        Ok(ShiftStatus::Unassigned)
    );
    assert_eq!(
        ShiftLifecycle::status_for_assignment(ShiftStatus::Completed, true),
        Err(ShiftError::AssignmentLocked(ShiftStatus::Completed))
    );
}

#[test]
fn test_status_parse_round_trip() {
    for status in [
        ShiftStatus::Unassigned,
        ShiftStatus::Requested,
        ShiftStatus::Assigned,
        ShiftStatus::InProgress,
        ShiftStatus::Completed,
        ShiftStatus::Cancelled,
    ] {
        assert_eq!(ShiftStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(ShiftStatus::parse("in-progress"), Some(ShiftStatus::InProgress));
    assert_eq!(ShiftStatus::parse("deleted"), None);
}

// ============================================================================
// Clash detection
// ============================================================================

fn booked(start: NaiveDateTime, end: NaiveDateTime, status: ShiftStatus) -> BookedShift {
    BookedShift {
        id: ShiftId::new(),
        range: TimeRange::new(start, end).unwrap(),
        status,
    }
}

#[test]
fn test_overlap_detected() {
    let existing = booked(
        at(2025, 1, 6, 9, 0),
        at(2025, 1, 6, 17, 0),
        ShiftStatus::Assigned,
    );
    let proposed = TimeRange::new(at(2025, 1, 6, 16, 0), at(2025, 1, 6, 20, 0)).unwrap();
    assert_eq!(find_clashes(&proposed, &[existing], None), vec![existing.id]);
}

#[test]
fn test_touching_shifts_do_not_clash() {
    let existing = booked(
        at(2025, 1, 6, 9, 0),
        at(2025, 1, 6, 17, 0),
        ShiftStatus::Assigned,
    );
    let proposed = TimeRange::new(at(2025, 1, 6, 17, 0), at(2025, 1, 6, 21, 0)).unwrap();
    assert!(find_clashes(&proposed, &[existing], None).is_empty());
}

#[test]
fn test_cancelled_and_excluded_shifts_ignored() {
    let cancelled = booked(
        at(2025, 1, 6, 9, 0),
        at(2025, 1, 6, 17, 0),
        ShiftStatus::Cancelled,
    );
    let editing = booked(
        at(2025, 1, 6, 9, 0),
        at(2025, 1, 6, 17, 0),
        ShiftStatus::Assigned,
    );
    let proposed = TimeRange::new(at(2025, 1, 6, 10, 0), at(2025, 1, 6, 12, 0)).unwrap();
    assert!(find_clashes(&proposed, &[cancelled, editing], Some(editing.id)).is_empty());
}

#[test]
fn test_series_clashes_report_occurrence_index() {
    let existing = booked(
        at(2025, 1, 13, 8, 0),
        at(2025, 1, 13, 10, 0),
        ShiftStatus::Assigned,
    );
    let occurrences = expand(
        at(2025, 1, 6, 9, 0),
        TimeDelta::hours(8),
        rule(
            RepeatUnit::Weekly,
            RecurrenceEnd::AfterOccurrences { count: 3 },
        ),
    )
    .unwrap();

    let clashes = find_series_clashes(&occurrences, &[existing]);
    assert_eq!(
        clashes,
        vec![SeriesClash {
            occurrence_index: 1,
            shift_id: existing.id
        }]
    );
}

#[test]
fn test_time_range_rejects_inverted_interval() {
    assert_eq!(
        TimeRange::new(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 9, 0)),
        Err(ShiftError::InvalidTimeRange)
    );
}
