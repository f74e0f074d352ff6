//! Calendar arithmetic for directive resolution.
//!
//! A [`CalendarDate`] is always a normalized proleptic Gregorian date. Every
//! directive resolves to `base + (day_number - start_index)` days, so the only
//! operation the rest of the crate needs is [`CalendarDate::add_days`]; month
//! and year rollovers, leap years, weekday and day-of-year all fall out of the
//! normalization done by `chrono`.
//!
//! ```text
//! 01/15/2024 (Mon) + 4   →  01/19/2024 (Fri)
//! 01/30/2024       + 2   →  02/01/2024
//! 03/01/2024       - 1   →  02/29/2024   (leap year)
//! ```

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid start date '{0}': expected MM/DD/YYYY")]
    InvalidFormat(String),
    #[error("Date {base} shifted by {offset} days is outside the supported calendar range")]
    OutOfRange { base: CalendarDate, offset: i64 },
    #[error("Day number {day_number} minus start index {start_index} overflows a day offset")]
    OffsetOverflow { day_number: i64, start_index: i64 },
}

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A normalized calendar date.
///
/// Immutable: arithmetic returns a new value. Weekday and day-of-year are
/// derived from the normalized year/month/day, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date from its components. Returns `None` for impossible dates
    /// such as February 30th.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Shift by `offset` days (negative moves backwards).
    ///
    /// The result is renormalized across month and year boundaries. Only
    /// offsets that leave the representable calendar (roughly ±262,000 years)
    /// fail.
    pub fn add_days(self, offset: i64) -> Result<Self, DateError> {
        TimeDelta::try_days(offset)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or(DateError::OutOfRange { base: self, offset })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month number, 1-12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month, 1-31.
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Day of the year, 1-366.
    pub fn day_of_year(&self) -> u32 {
        self.0.ordinal()
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[self.0.month0() as usize]
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES[self.0.weekday().num_days_from_sunday() as usize]
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.month(), self.day(), self.year())
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Parse the user-supplied school-year start date (`MM/DD/YYYY`).
///
/// Single-digit months and days (`8/5/2024`) are accepted.
pub fn parse_start_date(input: &str) -> Result<CalendarDate, DateError> {
    NaiveDate::parse_from_str(input.trim(), "%m/%d/%Y")
        .map(CalendarDate)
        .map_err(|_| DateError::InvalidFormat(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn add_zero_is_identity() {
        let d = date(2024, 8, 26);
        assert_eq!(d.add_days(0).unwrap(), d);
    }

    #[test]
    fn add_within_month() {
        let d = date(2024, 1, 15).add_days(4).unwrap();
        assert_eq!(d, date(2024, 1, 19));
        assert_eq!(d.weekday(), Weekday::Fri);
    }

    #[test]
    fn add_rolls_into_next_month() {
        assert_eq!(date(2024, 1, 30).add_days(2).unwrap(), date(2024, 2, 1));
    }

    #[test]
    fn add_rolls_into_next_year() {
        let d = date(2024, 12, 30).add_days(5).unwrap();
        assert_eq!(d, date(2025, 1, 4));
        assert_eq!(d.day_of_year(), 4);
    }

    #[test]
    fn negative_offset_crosses_leap_day() {
        assert_eq!(date(2024, 3, 1).add_days(-1).unwrap(), date(2024, 2, 29));
        assert_eq!(date(2023, 3, 1).add_days(-1).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn century_leap_rules() {
        // 2000 is a leap year, 1900 is not
        assert_eq!(date(2000, 2, 28).add_days(1).unwrap(), date(2000, 2, 29));
        assert_eq!(date(1900, 2, 28).add_days(1).unwrap(), date(1900, 3, 1));
    }

    #[test]
    fn large_offset() {
        let d = date(2024, 1, 1).add_days(366).unwrap();
        assert_eq!(d, date(2025, 1, 1));
        assert_eq!(date(2024, 1, 1).add_days(-3653).unwrap(), date(2014, 1, 1));
    }

    #[test]
    fn add_then_subtract_returns_original() {
        let bases = [date(2024, 1, 15), date(1999, 12, 31), date(2100, 2, 28)];
        let offsets = [-10_000, -366, -31, -1, 0, 1, 29, 365, 10_000];
        for base in bases {
            for offset in offsets {
                let shifted = base.add_days(offset).unwrap();
                assert_eq!(shifted.add_days(-offset).unwrap(), base, "{base} {offset}");
            }
        }
    }

    #[test]
    fn year_zero_and_negative_years_pass_through() {
        let d = date(1, 1, 1).add_days(-1).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (0, 12, 31));
        assert!(date(0, 1, 1).add_days(-400).unwrap().year() < 0);
    }

    #[test]
    fn offset_beyond_calendar_range_fails() {
        let base = date(2024, 1, 1);
        let err = base.add_days(i64::from(i32::MAX) * 10).unwrap_err();
        assert!(matches!(err, DateError::OutOfRange { .. }));
    }

    #[test]
    fn derived_names() {
        let d = date(2024, 1, 15);
        assert_eq!(d.month_name(), "January");
        assert_eq!(d.weekday_name(), "Monday");
        assert_eq!(date(2024, 9, 1).weekday_name(), "Sunday");
        assert_eq!(date(2024, 9, 7).weekday_name(), "Saturday");
    }

    #[test]
    fn display_is_us_style() {
        assert_eq!(date(2024, 8, 6).to_string(), "08/06/2024");
    }

    #[test]
    fn parse_start_date_accepts_us_format() {
        assert_eq!(parse_start_date("01/15/2024").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_start_date("8/5/2024").unwrap(), date(2024, 8, 5));
    }

    #[test]
    fn parse_start_date_rejects_other_formats() {
        for bad in ["2024-01-15", "13/01/2024", "02/30/2024", "", "today"] {
            assert!(
                matches!(parse_start_date(bad), Err(DateError::InvalidFormat(_))),
                "{bad} should be rejected"
            );
        }
    }
}
