use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use carebase_shared::types::{Money, ShiftId};

use super::*;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn no_holidays() -> BTreeSet<NaiveDate> {
    BTreeSet::new()
}

fn entry(item: &str, rate: Decimal) -> RateCardEntry {
    RateCardEntry {
        support_item_number: item.to_string(),
        description: format!("Assistance with self-care ({item})"),
        hourly_rate: Money::new(rate),
    }
}

fn full_card() -> RateCard {
    [
        (RateBand::WeekdayDaytime, entry("01_011_0107_1_1", dec!(70.23))),
        (RateBand::WeekdayEvening, entry("01_015_0107_1_1", dec!(77.38))),
        (RateBand::WeekdayNight, entry("01_002_0107_1_1", dec!(78.81))),
        (RateBand::Saturday, entry("01_013_0107_1_1", dec!(98.83))),
        (RateBand::Sunday, entry("01_014_0107_1_1", dec!(127.43))),
        (RateBand::PublicHoliday, entry("01_012_0107_1_1", dec!(156.03))),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Band classification
// ============================================================================

// 2025-01-06 is a Monday.
#[rstest]
#[case(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 17, 0), RateBand::WeekdayDaytime)]
#[case(at(2025, 1, 6, 6, 0), at(2025, 1, 6, 20, 0), RateBand::WeekdayDaytime)]
#[case(at(2025, 1, 6, 15, 0), at(2025, 1, 6, 21, 0), RateBand::WeekdayEvening)]
#[case(at(2025, 1, 6, 18, 0), at(2025, 1, 7, 0, 0), RateBand::WeekdayEvening)]
#[case(at(2025, 1, 6, 22, 0), at(2025, 1, 7, 6, 0), RateBand::WeekdayNight)]
#[case(at(2025, 1, 6, 5, 30), at(2025, 1, 6, 9, 0), RateBand::WeekdayNight)]
#[case(at(2025, 1, 11, 9, 0), at(2025, 1, 11, 17, 0), RateBand::Saturday)]
#[case(at(2025, 1, 12, 22, 0), at(2025, 1, 13, 6, 0), RateBand::Sunday)]
#[case(at(2025, 1, 10, 23, 0), at(2025, 1, 11, 7, 0), RateBand::WeekdayNight)]
fn test_classify(
    #[case] start: NaiveDateTime,
    #[case] end: NaiveDateTime,
    #[case] expected: RateBand,
) {
    assert_eq!(classify(start, end, &no_holidays()), expected);
}

#[test]
fn test_public_holiday_beats_weekend() {
    // Australia Day 2026 falls on a Monday; 2024-12-28 was a Saturday.
    let holidays: BTreeSet<_> = [
        NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 28).unwrap(),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        classify(at(2026, 1, 26, 9, 0), at(2026, 1, 26, 17, 0), &holidays),
        RateBand::PublicHoliday
    );
    assert_eq!(
        classify(at(2024, 12, 28, 9, 0), at(2024, 12, 28, 17, 0), &holidays),
        RateBand::PublicHoliday
    );
}

#[test]
fn test_band_parse_round_trip() {
    for band in RateBand::ALL {
        assert_eq!(RateBand::parse(band.as_str()), Some(band));
    }
    assert_eq!(RateBand::parse("weekday"), None);
}

// ============================================================================
// Pricing
// ============================================================================

#[rstest]
#[case(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 17, 0), dec!(8.00))]
#[case(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 9, 20), dec!(0.33))]
#[case(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 9, 50), dec!(0.83))]
#[case(at(2025, 1, 6, 9, 0), at(2025, 1, 6, 10, 45), dec!(1.75))]
fn test_billable_hours(
    #[case] start: NaiveDateTime,
    #[case] end: NaiveDateTime,
    #[case] expected: Decimal,
) {
    assert_eq!(billable_hours(start, end).unwrap(), expected);
}

#[test]
fn test_billable_hours_rejects_empty_shift() {
    let t = at(2025, 1, 6, 9, 0);
    assert_eq!(billable_hours(t, t), Err(BillingError::InvalidDuration));
}

#[test]
fn test_price_weekday_shift() {
    let shift = BillableShift {
        shift_id: ShiftId::new(),
        start: at(2025, 1, 6, 9, 0),
        end: at(2025, 1, 6, 17, 0),
    };

    let line = price_shift(&shift, &full_card(), &no_holidays()).unwrap();

    assert_eq!(line.rate_band, RateBand::WeekdayDaytime);
    assert_eq!(line.support_item_number, "01_011_0107_1_1");
    assert_eq!(line.hours, dec!(8.00));
    assert_eq!(line.line_total.amount(), dec!(561.84));
    assert_eq!(
        line.service_date,
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    );
}

#[test]
fn test_line_total_rounds_half_away_from_zero() {
    let card: RateCard = [(RateBand::WeekdayDaytime, entry("X", dec!(10.05)))]
        .into_iter()
        .collect();
    // 0.50h * 10.05 = 5.025 -> 5.03
    let shift = BillableShift {
        shift_id: ShiftId::new(),
        start: at(2025, 1, 6, 9, 0),
        end: at(2025, 1, 6, 9, 30),
    };
    let line = price_shift(&shift, &card, &no_holidays()).unwrap();
    assert_eq!(line.line_total.amount(), dec!(5.03));
}

#[test]
fn test_missing_rate() {
    let card: RateCard = [(RateBand::WeekdayDaytime, entry("X", dec!(70)))]
        .into_iter()
        .collect();
    let shift = BillableShift {
        shift_id: ShiftId::new(),
        start: at(2025, 1, 11, 9, 0),
        end: at(2025, 1, 11, 12, 0),
    };
    assert_eq!(
        price_shift(&shift, &card, &no_holidays()),
        Err(BillingError::MissingRate(RateBand::Saturday))
    );
    assert_eq!(card.missing_bands().len(), 5);
}

#[test]
fn test_price_shifts_orders_by_start_and_totals() {
    let later = BillableShift {
        shift_id: ShiftId::new(),
        start: at(2025, 1, 11, 9, 0),
        end: at(2025, 1, 11, 12, 0),
    };
    let earlier = BillableShift {
        shift_id: ShiftId::new(),
        start: at(2025, 1, 6, 9, 0),
        end: at(2025, 1, 6, 11, 0),
    };

    let lines = price_shifts(&[later, earlier], &full_card(), &no_holidays()).unwrap();
    assert_eq!(lines[0].shift_id, earlier.shift_id);
    assert_eq!(lines[1].shift_id, later.shift_id);

    let totals = InvoiceTotals::from_lines(&lines);
    // 2h * 70.23 + 3h * 98.83
    assert_eq!(totals.subtotal.amount(), dec!(436.95));
    assert_eq!(totals.total_hours, dec!(5.00));
    assert_eq!(totals.line_count, 2);
}

#[test]
fn test_price_shifts_requires_shifts() {
    assert_eq!(
        price_shifts(&[], &full_card(), &no_holidays()),
        Err(BillingError::NothingToBill)
    );
}

// ============================================================================
// Invoices
// ============================================================================

#[rstest]
#[case(1, "INV-000001")]
#[case(42, "INV-000042")]
#[case(1_234_567, "INV-1234567")]
fn test_invoice_number(#[case] sequence: u64, #[case] expected: &str) {
    assert_eq!(invoice_number(sequence), expected);
    assert_eq!(parse_invoice_sequence(expected), Some(sequence));
}

#[test]
fn test_parse_invoice_sequence_rejects_foreign_format() {
    assert_eq!(parse_invoice_sequence("2025-001"), None);
}

#[rstest]
#[case(InvoiceStatus::Draft, InvoiceStatus::Issued, true)]
#[case(InvoiceStatus::Draft, InvoiceStatus::Void, true)]
#[case(InvoiceStatus::Issued, InvoiceStatus::Paid, true)]
#[case(InvoiceStatus::Issued, InvoiceStatus::Void, true)]
#[case(InvoiceStatus::Draft, InvoiceStatus::Paid, false)]
#[case(InvoiceStatus::Paid, InvoiceStatus::Void, false)]
#[case(InvoiceStatus::Void, InvoiceStatus::Draft, false)]
fn test_invoice_transitions(
    #[case] from: InvoiceStatus,
    #[case] to: InvoiceStatus,
    #[case] allowed: bool,
) {
    assert_eq!(from.transition(to).is_ok(), allowed);
}
