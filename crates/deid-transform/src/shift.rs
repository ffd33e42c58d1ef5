//! Day-offset arithmetic.
//!
//! All arithmetic is on naive (zone-free) values: a datetime is a wall clock
//! read as if it were UTC, so adding whole days never gains or loses the
//! hour a local daylight-saving transition would.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use deid_common::{format_numeric, parse_f64, parse_i64};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Canonical output format of shifted date columns.
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";
/// Canonical output format of shifted datetime columns.
pub const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Adds `days` to a calendar date. `None` on overflow.
pub fn shift_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}

/// Adds `days × 86400` seconds to a wall-clock datetime. `None` on overflow.
pub fn shift_datetime(datetime: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let seconds = days.checked_mul(SECONDS_PER_DAY)?;
    datetime.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_OUTPUT_FORMAT).to_string()
}

pub fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_OUTPUT_FORMAT).to_string()
}

/// Seconds since 1970-01-01 00:00:00 UTC, as stored in the export.
///
/// Integer values stay integers so large epochs keep full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpochSeconds {
    Integer(i64),
    Fractional(f64),
}

impl EpochSeconds {
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(seconds) = parse_i64(value) {
            return Some(Self::Integer(seconds));
        }
        parse_f64(value).map(Self::Fractional)
    }

    /// Adds `days × 86400` to the raw number. `None` on overflow.
    pub fn shift(self, days: i64) -> Option<Self> {
        let delta = days.checked_mul(SECONDS_PER_DAY)?;
        match self {
            Self::Integer(seconds) => seconds.checked_add(delta).map(Self::Integer),
            Self::Fractional(seconds) => {
                let shifted = seconds + delta as f64;
                shifted.is_finite().then_some(Self::Fractional(shifted))
            }
        }
    }
}

impl fmt::Display for EpochSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(seconds) => write!(f, "{seconds}"),
            Self::Fractional(seconds) => f.write_str(&format_numeric(*seconds)),
        }
    }
}

/// Parses, shifts and formats one epoch cell.
pub fn shift_epoch(value: &str, days: i64) -> Option<String> {
    EpochSeconds::parse(value)?
        .shift(days)
        .map(|shifted| shifted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_shift_crosses_month_and_year() {
        let date = NaiveDate::from_ymd_opt(2019, 12, 30).unwrap();
        assert_eq!(format_date(shift_date(date, 4).unwrap()), "2020-01-03");
        assert_eq!(format_date(shift_date(date, -30).unwrap()), "2019-11-30");
    }

    #[test]
    fn datetime_shift_keeps_wall_clock() {
        let dt = NaiveDate::from_ymd_opt(2020, 3, 7)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        assert_eq!(format_datetime(shift_datetime(dt, 1).unwrap()), "2020-03-08 23:30:00");
    }

    #[test]
    fn epoch_shift_integer_and_fractional() {
        assert_eq!(shift_epoch("1700000000", 2).as_deref(), Some("1700172800"));
        assert_eq!(shift_epoch("1700000000.25", -1).as_deref(), Some("1699913600.25"));
        assert_eq!(shift_epoch("soon", 1), None);
    }

    #[test]
    fn overflow_is_none() {
        assert_eq!(shift_epoch(&i64::MAX.to_string(), 1), None);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(shift_date(date, i64::MAX).is_none());
    }
}
