//! Property-based tests for recurring shift expansion.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;

use super::recurrence::{MAX_OCCURRENCES, RecurrenceEnd, RecurrenceRule, RepeatUnit, expand};

/// Start times between 2020 and 2030 on a 15-minute grid.
fn start_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..3_650, 0i64..96).prop_map(|(day, quarter)| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::days(day)
            + TimeDelta::minutes(quarter * 15)
    })
}

/// Durations from 15 minutes to 24 hours.
fn duration_strategy() -> impl Strategy<Value = TimeDelta> {
    (1i64..=96).prop_map(|quarters| TimeDelta::minutes(quarters * 15))
}

fn unit_strategy() -> impl Strategy<Value = RepeatUnit> {
    prop_oneof![
        Just(RepeatUnit::Daily),
        Just(RepeatUnit::Weekly),
        Just(RepeatUnit::Fortnightly),
        Just(RepeatUnit::Monthly),
    ]
}

fn expected_start(anchor: NaiveDateTime, unit: RepeatUnit, k: u32) -> NaiveDateTime {
    match unit {
        RepeatUnit::Daily => anchor + TimeDelta::days(i64::from(k)),
        RepeatUnit::Weekly => anchor + TimeDelta::days(7 * i64::from(k)),
        RepeatUnit::Fortnightly => anchor + TimeDelta::days(14 * i64::from(k)),
        RepeatUnit::Monthly => anchor.checked_add_months(Months::new(k)).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A count-bounded series has exactly N occurrences, each `duration` long,
    /// spaced by the unit's calendar increment from the first shift.
    #[test]
    fn prop_count_bound_exact(
        start in start_strategy(),
        duration in duration_strategy(),
        unit in unit_strategy(),
        count in 1u32..=MAX_OCCURRENCES,
    ) {
        let rule = RecurrenceRule { frequency: unit, end: RecurrenceEnd::AfterOccurrences { count } };
        let occurrences = expand(start, duration, rule).unwrap();

        prop_assert_eq!(occurrences.len(), count as usize);
        for (k, occurrence) in occurrences.iter().enumerate() {
            let k = u32::try_from(k).unwrap();
            prop_assert_eq!(occurrence.index, k);
            prop_assert_eq!(occurrence.start, expected_start(start, unit, k));
            prop_assert_eq!(occurrence.end - occurrence.start, duration);
            prop_assert_eq!(occurrence.start.time(), start.time());
        }
    }

    /// Occurrences are strictly increasing.
    #[test]
    fn prop_occurrences_ordered(
        start in start_strategy(),
        duration in duration_strategy(),
        unit in unit_strategy(),
        count in 2u32..=MAX_OCCURRENCES,
    ) {
        let rule = RecurrenceRule { frequency: unit, end: RecurrenceEnd::AfterOccurrences { count } };
        let occurrences = expand(start, duration, rule).unwrap();
        prop_assert!(occurrences.windows(2).all(|w| w[0].start < w[1].start));
    }

    /// A date-bounded series stays within the bound and is maximal.
    #[test]
    fn prop_date_bound_inclusive_and_maximal(
        start in start_strategy(),
        duration in duration_strategy(),
        unit in unit_strategy(),
        days_ahead in 0i64..120,
    ) {
        let until = start.date() + TimeDelta::days(days_ahead);
        let rule = RecurrenceRule { frequency: unit, end: RecurrenceEnd::OnDate { until } };

        match expand(start, duration, rule) {
            Ok(occurrences) => {
                prop_assert!(!occurrences.is_empty());
                let last = occurrences.last().unwrap();
                prop_assert!(last.start.date() <= until);

                let next = expected_start(start, unit, last.index + 1);
                prop_assert!(next.date() > until);
            }
            Err(err) => {
                // Only daily repeats can exceed the limit within 120 days.
                prop_assert_eq!(unit, RepeatUnit::Daily);
                prop_assert!(days_ahead >= i64::from(MAX_OCCURRENCES));
                let too_many = matches!(err, super::RecurrenceError::TooManyOccurrences { .. });
                prop_assert!(too_many, "unexpected error: {:?}", err);
            }
        }
    }

    /// Monthly occurrences land on the anchor day or the last day of a shorter month.
    #[test]
    fn prop_monthly_day_anchor(
        start in start_strategy(),
        count in 1u32..=24,
    ) {
        let rule = RecurrenceRule {
            frequency: RepeatUnit::Monthly,
            end: RecurrenceEnd::AfterOccurrences { count },
        };
        let anchor_day = start.day();
        for occurrence in expand(start, TimeDelta::hours(1), rule).unwrap() {
            let day = occurrence.start.day();
            let next_day = occurrence.start.date().succ_opt().unwrap();
            prop_assert!(day == anchor_day || (day < anchor_day && next_day.day() == 1));
        }
    }
}
