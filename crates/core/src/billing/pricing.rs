//! Shift pricing against a tenant rate card.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use carebase_shared::types::{Money, ShiftId};

use super::band::{RateBand, classify};
use super::error::BillingError;

/// Price of one band on a rate card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCardEntry {
    /// NDIS support item number claimed for this band.
    pub support_item_number: String,
    /// Line description printed on the invoice.
    pub description: String,
    /// Price per hour.
    pub hourly_rate: Money,
}

/// A tenant's hourly prices by band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateCard {
    entries: BTreeMap<RateBand, RateCardEntry>,
}

impl RateCard {
    /// Creates an empty rate card.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the price for a band, replacing any previous entry.
    pub fn insert(&mut self, band: RateBand, entry: RateCardEntry) {
        self.entries.insert(band, entry);
    }

    /// Returns the price for a band.
    #[must_use]
    pub fn get(&self, band: RateBand) -> Option<&RateCardEntry> {
        self.entries.get(&band)
    }

    /// Bands with no configured price.
    #[must_use]
    pub fn missing_bands(&self) -> Vec<RateBand> {
        RateBand::ALL
            .into_iter()
            .filter(|band| !self.entries.contains_key(band))
            .collect()
    }
}

impl FromIterator<(RateBand, RateCardEntry)> for RateCard {
    fn from_iter<I: IntoIterator<Item = (RateBand, RateCardEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A completed shift awaiting billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillableShift {
    /// Shift identifier.
    pub shift_id: ShiftId,
    /// Start time.
    pub start: NaiveDateTime,
    /// End time.
    pub end: NaiveDateTime,
}

/// One priced invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    /// Shift being billed.
    pub shift_id: ShiftId,
    /// Date the support was delivered (shift start date).
    pub service_date: NaiveDate,
    /// Band the shift was classified into.
    pub rate_band: RateBand,
    /// NDIS support item number.
    pub support_item_number: String,
    /// Line description.
    pub description: String,
    /// Hours delivered, to two decimal places.
    pub hours: Decimal,
    /// Hourly price.
    pub unit_price: Money,
    /// `hours * unit_price`, rounded to cents.
    pub line_total: Money,
}

/// Hours between two instants, to two decimal places.
///
/// # Errors
///
/// Returns `BillingError::InvalidDuration` if `end <= start`.
pub fn billable_hours(start: NaiveDateTime, end: NaiveDateTime) -> Result<Decimal, BillingError> {
    let minutes = (end - start).num_minutes();
    if minutes <= 0 {
        return Err(BillingError::InvalidDuration);
    }

    Ok((Decimal::from(minutes) / Decimal::from(60))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Prices a single shift.
///
/// # Errors
///
/// - `InvalidDuration` when the shift has no positive length
/// - `MissingRate` when the rate card has no entry for the shift's band
pub fn price_shift(
    shift: &BillableShift,
    card: &RateCard,
    holidays: &BTreeSet<NaiveDate>,
) -> Result<PricedLine, BillingError> {
    let hours = billable_hours(shift.start, shift.end)?;
    let rate_band = classify(shift.start, shift.end, holidays);
    let entry = card.get(rate_band).ok_or(BillingError::MissingRate(rate_band))?;

    Ok(PricedLine {
        shift_id: shift.shift_id,
        service_date: shift.start.date(),
        rate_band,
        support_item_number: entry.support_item_number.clone(),
        description: entry.description.clone(),
        hours,
        unit_price: entry.hourly_rate,
        line_total: entry.hourly_rate.times(hours),
    })
}

/// Prices every shift in start order. Fails on the first shift that cannot be priced.
///
/// # Errors
///
/// - `NothingToBill` when `shifts` is empty
/// - any error from [`price_shift`]
pub fn price_shifts(
    shifts: &[BillableShift],
    card: &RateCard,
    holidays: &BTreeSet<NaiveDate>,
) -> Result<Vec<PricedLine>, BillingError> {
    if shifts.is_empty() {
        return Err(BillingError::NothingToBill);
    }

    let mut ordered: Vec<&BillableShift> = shifts.iter().collect();
    ordered.sort_by_key(|shift| (shift.start, shift.shift_id));

    ordered
        .into_iter()
        .map(|shift| price_shift(shift, card, holidays))
        .collect()
}
