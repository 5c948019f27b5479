//! Date and date-time columns over their raw wire counters, plus the conversions
//! shared with the writers.
//!
//! Raw values are converted on access. Supported ranges:
//!
//! | type         | range                                              |
//! |--------------|----------------------------------------------------|
//! | `Date`       | 1970-01-01 ..= 2149-06-06                          |
//! | `Date32`     | 1900-01-01 ..= 2299-12-31                          |
//! | `DateTime`   | 1970-01-01 00:00:00 ..= 2106-02-07 06:28:15 UTC    |
//! | `DateTime64` | 1900-01-01 00:00:00 ..= 2299-12-31 23:59:59.9.. UTC   |
//!
//! At precision 9 the `i64` tick counter ends first, at
//! 2262-04-11 23:47:16.854775807 UTC; see [`datetime64_tick_bounds`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use chwire_common::{Result, error::Error};

use super::{AnyColumn, Column, row_out_of_range};

pub const DATE_RANGE: &str = "[1970-01-01, 2149-06-06]";
pub const DATE32_RANGE: &str = "[1900-01-01, 2299-12-31]";
pub const DATETIME_RANGE: &str = "[1970-01-01 00:00:00, 2106-02-07 06:28:15] UTC";

/// Days since 1970-01-01 of the first and last valid `Date32`.
pub const DATE32_MIN_DAYS: i64 = -25_567;
pub const DATE32_MAX_DAYS: i64 = 120_529;

/// Seconds since the epoch bounding `DateTime64` values.
pub const DATETIME64_MIN_SECONDS: i64 = -2_208_988_800;
pub const DATETIME64_MAX_SECONDS: i64 = 10_413_791_999;

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

pub fn days_to_date(days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| epoch().checked_add_signed(delta))
        .ok_or_else(|| Error::overflow(format!("{days} days since 1970-01-01 is not a valid date")))
}

pub fn date_to_days(date: NaiveDate) -> i64 {
    date.signed_duration_since(epoch()).num_days()
}

pub fn seconds_to_datetime(seconds: i64, nanos: u32, tz: Tz) -> Result<DateTime<Tz>> {
    DateTime::from_timestamp(seconds, nanos)
        .map(|utc| utc.with_timezone(&tz))
        .ok_or_else(|| Error::overflow(format!("timestamp {seconds} is out of range")))
}

pub fn ticks_per_second(precision: u32) -> i64 {
    10i64.pow(precision)
}

/// First and last valid `DateTime64(precision)` tick counts.
pub fn datetime64_tick_bounds(precision: u32) -> (i64, i64) {
    let scale = ticks_per_second(precision);
    let min = DATETIME64_MIN_SECONDS.saturating_mul(scale);
    let max = DATETIME64_MAX_SECONDS
        .checked_mul(scale)
        .and_then(|ticks| ticks.checked_add(scale - 1))
        .unwrap_or(i64::MAX);
    (min, max)
}

/// The valid `DateTime64(precision)` range, formatted for error messages.
pub fn datetime64_range(precision: u32) -> String {
    let (min, max) = datetime64_tick_bounds(precision);
    let format = |ticks: i64| {
        let scale = ticks_per_second(precision);
        let nanos = ticks.rem_euclid(scale) * 10i64.pow(9 - precision);
        DateTime::from_timestamp(ticks.div_euclid(scale), nanos as u32)
            .map(|value| value.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_else(|| ticks.to_string())
    };
    format!("[{}, {}] UTC", format(min), format(max))
}

fn datetime64_overflow(precision: u32, got: impl std::fmt::Display) -> Error {
    Error::overflow(format!(
        "DateTime64({precision}) value must be within {}, got {got}",
        datetime64_range(precision)
    ))
}

/// Converts `DateTime64(precision)` ticks to a date-time.
pub fn ticks_to_datetime(ticks: i64, precision: u32, tz: Tz) -> Result<DateTime<Tz>> {
    let (min, max) = datetime64_tick_bounds(precision);
    if !(min..=max).contains(&ticks) {
        return Err(datetime64_overflow(precision, format!("{ticks} ticks")));
    }
    let scale = ticks_per_second(precision);
    let nanos = ticks.rem_euclid(scale) * 10i64.pow(9 - precision);
    seconds_to_datetime(ticks.div_euclid(scale), nanos as u32, tz)
}

/// Converts a date-time to `DateTime64(precision)` ticks, truncating sub-tick
/// nanoseconds.
pub fn datetime_to_ticks<Z: TimeZone>(value: &DateTime<Z>, precision: u32) -> Result<i64> {
    let (min, max) = datetime64_tick_bounds(precision);
    let fraction = i64::from(value.timestamp_subsec_nanos()) / 10i64.pow(9 - precision);
    value
        .timestamp()
        .checked_mul(ticks_per_second(precision))
        .and_then(|ticks| ticks.checked_add(fraction))
        .filter(|ticks| (min..=max).contains(ticks))
        .ok_or_else(|| datetime64_overflow(precision, value.with_timezone(&Utc)))
}

/// Raw day counters of `Date` (`u16`) and `Date32` (`i32`).
pub trait DayCount: Copy + Send + Sync + 'static {
    fn days(self) -> i64;
}

impl DayCount for u16 {
    fn days(self) -> i64 {
        i64::from(self)
    }
}

impl DayCount for i32 {
    fn days(self) -> i64 {
        i64::from(self)
    }
}

pub struct DateColumn<R> {
    days: Arc<[R]>,
}

impl<R: DayCount> DateColumn<R> {
    pub fn new(days: impl Into<Arc<[R]>>) -> DateColumn<R> {
        DateColumn { days: days.into() }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::Date(Arc::new(self))
    }
}

impl<R: DayCount> Column<NaiveDate> for DateColumn<R> {
    fn row_count(&self) -> usize {
        self.days.len()
    }

    fn value(&self, index: usize) -> Result<NaiveDate> {
        let days = self
            .days
            .get(index)
            .ok_or_else(|| row_out_of_range(index, self.days.len()))?;
        days_to_date(days.days())
    }

    fn default_value(&self) -> Option<NaiveDate> {
        Some(epoch())
    }
}

/// `DateTime`: seconds since the epoch as `u32`, presented in `tz`.
pub struct DateTimeColumn {
    seconds: Arc<[u32]>,
    tz: Tz,
}

impl DateTimeColumn {
    pub fn new(seconds: impl Into<Arc<[u32]>>, tz: Tz) -> DateTimeColumn {
        DateTimeColumn {
            seconds: seconds.into(),
            tz,
        }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::DateTime(Arc::new(self))
    }
}

impl Column<DateTime<Tz>> for DateTimeColumn {
    fn row_count(&self) -> usize {
        self.seconds.len()
    }

    fn value(&self, index: usize) -> Result<DateTime<Tz>> {
        let seconds = self
            .seconds
            .get(index)
            .ok_or_else(|| row_out_of_range(index, self.seconds.len()))?;
        seconds_to_datetime(i64::from(*seconds), 0, self.tz)
    }

    fn default_value(&self) -> Option<DateTime<Tz>> {
        seconds_to_datetime(0, 0, self.tz).ok()
    }
}

/// `DateTime64(precision)`: signed ticks of `10^-precision` seconds.
pub struct DateTime64Column {
    ticks: Arc<[i64]>,
    precision: u32,
    tz: Tz,
}

impl DateTime64Column {
    pub fn new(ticks: impl Into<Arc<[i64]>>, precision: u32, tz: Tz) -> DateTime64Column {
        DateTime64Column {
            ticks: ticks.into(),
            precision,
            tz,
        }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::DateTime(Arc::new(self))
    }
}

impl Column<DateTime<Tz>> for DateTime64Column {
    fn row_count(&self) -> usize {
        self.ticks.len()
    }

    fn value(&self, index: usize) -> Result<DateTime<Tz>> {
        let ticks = self
            .ticks
            .get(index)
            .ok_or_else(|| row_out_of_range(index, self.ticks.len()))?;
        ticks_to_datetime(*ticks, self.precision, self.tz)
    }

    fn default_value(&self) -> Option<DateTime<Tz>> {
        seconds_to_datetime(0, 0, self.tz).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use chwire_common::error::ErrorKind;

    #[test]
    fn test_date_bounds() {
        assert_eq!(days_to_date(0).unwrap(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(
            days_to_date(65535).unwrap(),
            NaiveDate::from_ymd_opt(2149, 6, 6).unwrap()
        );
        assert_eq!(
            days_to_date(DATE32_MIN_DAYS).unwrap(),
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
        );
        assert_eq!(
            days_to_date(DATE32_MAX_DAYS).unwrap(),
            NaiveDate::from_ymd_opt(2299, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_datetime_column_time_zone() {
        let column = DateTimeColumn::new(vec![0u32, u32::MAX], chrono_tz::Asia::Tokyo);
        let first = column.value(0).unwrap();
        assert_eq!(first.hour(), 9);
        assert_eq!(first.timestamp(), 0);
        let last = column.value(1).unwrap().with_timezone(&Utc);
        assert_eq!((last.year(), last.month(), last.day()), (2106, 2, 7));
    }

    #[test]
    fn test_datetime64_ticks() {
        let tz = chrono_tz::UTC;
        let value = ticks_to_datetime(-1, 3, tz).unwrap();
        assert_eq!(value.timestamp(), -1);
        assert_eq!(value.timestamp_subsec_millis(), 999);
        assert_eq!(datetime_to_ticks(&value, 3).unwrap(), -1);

        let err = ticks_to_datetime(i64::MAX, 0, tz).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Overflow { .. }));
    }

    #[test]
    fn test_datetime64_tick_bounds() {
        assert_eq!(
            datetime64_tick_bounds(0),
            (DATETIME64_MIN_SECONDS, DATETIME64_MAX_SECONDS)
        );
        assert_eq!(datetime64_tick_bounds(3).1, DATETIME64_MAX_SECONDS * 1000 + 999);
        assert_eq!(datetime64_tick_bounds(9).1, i64::MAX);
        assert_eq!(
            datetime64_range(9),
            "[1900-01-01 00:00:00, 2262-04-11 23:47:16.854775807] UTC"
        );
        assert!(ticks_to_datetime(i64::MIN, 9, chrono_tz::UTC).is_err());
        assert!(ticks_to_datetime(i64::MAX, 9, chrono_tz::UTC).is_ok());
    }
}
