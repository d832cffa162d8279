//! NDIS time-of-day rate bands.
//!
//! The band is decided by when a shift starts:
//! 1. a public holiday (by start date) is always `PublicHoliday`
//! 2. Saturday and Sunday starts use the weekend bands
//! 3. weekday shifts starting before 06:00 or finishing after midnight are `WeekdayNight`
//! 4. weekday shifts finishing after 20:00 are `WeekdayEvening`
//! 5. everything else is `WeekdayDaytime`

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Price category of a support delivered at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBand {
    /// Monday to Friday, 06:00 to 20:00.
    WeekdayDaytime,
    /// Monday to Friday, finishing after 20:00.
    WeekdayEvening,
    /// Monday to Friday, starting before 06:00 or finishing after midnight.
    WeekdayNight,
    /// Any time on Saturday.
    Saturday,
    /// Any time on Sunday.
    Sunday,
    /// Any time on a gazetted public holiday.
    PublicHoliday,
}

impl RateBand {
    /// All bands, in rate card order.
    pub const ALL: [Self; 6] = [
        Self::WeekdayDaytime,
        Self::WeekdayEvening,
        Self::WeekdayNight,
        Self::Saturday,
        Self::Sunday,
        Self::PublicHoliday,
    ];

    /// Returns the string representation of the band.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WeekdayDaytime => "weekday_daytime",
            Self::WeekdayEvening => "weekday_evening",
            Self::WeekdayNight => "weekday_night",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
            Self::PublicHoliday => "public_holiday",
        }
    }

    /// Parses a band from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.as_str() == s)
    }
}

impl fmt::Display for RateBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const NIGHT_ENDS: NaiveTime = match NaiveTime::from_hms_opt(6, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

const EVENING_STARTS: NaiveTime = match NaiveTime::from_hms_opt(20, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// Classifies a shift into its rate band.
///
/// Callers validate that `end > start` before pricing.
#[must_use]
pub fn classify(start: NaiveDateTime, end: NaiveDateTime, holidays: &BTreeSet<NaiveDate>) -> RateBand {
    let day = start.date();

    if holidays.contains(&day) {
        return RateBand::PublicHoliday;
    }

    match day.weekday() {
        Weekday::Sat => return RateBand::Saturday,
        Weekday::Sun => return RateBand::Sunday,
        _ => {}
    }

    let finishes_after_midnight = day
        .succ_opt()
        .is_some_and(|next| end > next.and_time(NaiveTime::MIN));

    if start.time() < NIGHT_ENDS || finishes_after_midnight {
        RateBand::WeekdayNight
    } else if end > day.and_time(EVENING_STARTS) {
        RateBand::WeekdayEvening
    } else {
        RateBand::WeekdayDaytime
    }
}
