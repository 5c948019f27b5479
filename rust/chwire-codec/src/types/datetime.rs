use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use chwire_common::{Result, error::Error};

use crate::column::AnyColumn;
use crate::column::date::{DATETIME_RANGE, DateTime64Column, DateTimeColumn, datetime_to_ticks};
use crate::reader::{ColumnReader, SkippingColumnReader};
use crate::reader::fixed::{FixedColumnReader, FixedSkipReader};
use crate::value::ValueKind;
use crate::writer::{ColumnWriter, FixedColumnWriter, require};

use super::{ColumnType, TypeArg, TypeName, TypeSettings};

pub const MAX_DATETIME64_PRECISION: u32 = 9;

fn parse_time_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::invalid_arg("time_zone", format!("unknown time zone '{name}'")))
}

/// `DateTime[(tz)]`: seconds since the epoch as `u32`.
///
/// Without an explicit zone, values are presented in the server zone applied by
/// [`ColumnType::configure`].
#[derive(Debug, Clone, Copy)]
pub struct DateTimeType {
    explicit_tz: Option<Tz>,
    tz: Tz,
}

impl DateTimeType {
    pub fn new(time_zone: Option<&str>) -> Result<DateTimeType> {
        let explicit_tz = time_zone.map(parse_time_zone).transpose()?;
        Ok(DateTimeType {
            explicit_tz,
            tz: explicit_tz.unwrap_or(Tz::UTC),
        })
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }
}

impl ColumnType for DateTimeType {
    fn type_name(&self) -> TypeName {
        let args = self
            .explicit_tz
            .map(|tz| TypeArg::String(tz.name().to_string()))
            .into_iter()
            .collect();
        TypeName::with_args("DateTime", args)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        if self.explicit_tz.is_some() || self.tz == settings.time_zone {
            return None;
        }
        Some(Arc::new(DateTimeType {
            explicit_tz: None,
            tz: settings.time_zone,
        }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        let tz = self.tz;
        Ok(Box::new(FixedColumnReader::<u32>::new(row_count, move |raw| {
            Ok(DateTimeColumn::new(raw, tz).into_any())
        })))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(FixedSkipReader::new(row_count, 4)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let source = require::<DateTime<Tz>>(self, name, column)?;
        Ok(Box::new(FixedColumnWriter::new(name, source, |v: DateTime<Tz>| {
            u32::try_from(v.timestamp()).map_err(|_| {
                Error::overflow(format!(
                    "DateTime value must be within {DATETIME_RANGE}, got {}",
                    v.to_utc()
                ))
            })
        })))
    }
}

/// `DateTime64(precision[, tz])`: signed ticks of `10^-precision` seconds.
#[derive(Debug, Clone, Copy)]
pub struct DateTime64Type {
    precision: u32,
    explicit_tz: Option<Tz>,
    tz: Tz,
}

impl DateTime64Type {
    pub fn new(precision: u32, time_zone: Option<&str>) -> Result<DateTime64Type> {
        if precision > MAX_DATETIME64_PRECISION {
            return Err(Error::invalid_arg(
                "precision",
                format!("DateTime64 precision {precision} exceeds {MAX_DATETIME64_PRECISION}"),
            ));
        }
        let explicit_tz = time_zone.map(parse_time_zone).transpose()?;
        Ok(DateTime64Type {
            precision,
            explicit_tz,
            tz: explicit_tz.unwrap_or(Tz::UTC),
        })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }
}

impl ColumnType for DateTime64Type {
    fn type_name(&self) -> TypeName {
        let mut args = vec![TypeArg::Number(i64::from(self.precision))];
        if let Some(tz) = self.explicit_tz {
            args.push(TypeArg::String(tz.name().to_string()));
        }
        TypeName::with_args("DateTime64", args)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        if self.explicit_tz.is_some() || self.tz == settings.time_zone {
            return None;
        }
        Some(Arc::new(DateTime64Type {
            tz: settings.time_zone,
            ..*self
        }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        let (precision, tz) = (self.precision, self.tz);
        Ok(Box::new(FixedColumnReader::<i64>::new(row_count, move |raw| {
            Ok(DateTime64Column::new(raw, precision, tz).into_any())
        })))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(FixedSkipReader::new(row_count, 8)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let source = require::<DateTime<Tz>>(self, name, column)?;
        let precision = self.precision;
        Ok(Box::new(FixedColumnWriter::new(name, source, move |v: DateTime<Tz>| {
            datetime_to_ticks(&v, precision)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;
    use crate::reader::read_column;
    use crate::writer::write_column;
    use crate::value::Value;
    use chrono::{TimeDelta, TimeZone, Timelike};
    use chwire_common::error::ErrorKind;

    #[test]
    fn test_server_time_zone_applies_without_explicit_zone() {
        let settings = TypeSettings::default().with_time_zone(chrono_tz::Europe::Berlin);
        let implicit = DateTimeType::new(None).unwrap();
        let configured = implicit.configure(&settings).unwrap();
        let column = read_column(
            configured.create_plain_reader(1).unwrap(),
            &0u32.to_le_bytes(),
        )
        .unwrap();
        let value = column.try_reinterpret_as::<DateTime<Tz>>().unwrap().value(0).unwrap();
        assert_eq!(value.hour(), 1);
        assert_eq!(configured.type_name().to_string(), "DateTime");

        let explicit = DateTimeType::new(Some("Asia/Tokyo")).unwrap();
        assert!(explicit.configure(&settings).is_none());
    }

    #[test]
    fn test_datetime64_round_trip() {
        let ty = DateTime64Type::new(3, Some("UTC")).unwrap();
        let value = Tz::UTC.with_ymd_and_hms(2299, 12, 31, 23, 59, 59).unwrap();
        let column = PrimitiveColumn::new(vec![value]).into_any();
        let mut writer = ty.create_column_writer("t", &column).unwrap();
        let bytes = write_column(writer.as_mut()).unwrap();
        let decoded = read_column(ty.create_plain_reader(1).unwrap(), &bytes).unwrap();
        assert_eq!(decoded.values().unwrap(), column.values().unwrap());
    }

    #[test]
    fn test_datetime64_range_depends_on_precision() {
        let utc = |y, mo, d, h, mi, s, nanos| {
            Tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap() + TimeDelta::nanoseconds(nanos)
        };
        let first = utc(1900, 1, 1, 0, 0, 0, 0);
        let cases = [
            (0, utc(2299, 12, 31, 23, 59, 59, 0)),
            (3, utc(2299, 12, 31, 23, 59, 59, 999_000_000)),
            (9, utc(2262, 4, 11, 23, 47, 16, 854_775_807)),
        ];
        for (precision, last) in cases {
            let ty = DateTime64Type::new(precision, Some("UTC")).unwrap();
            let write = |value: DateTime<Tz>| {
                let column = PrimitiveColumn::new(vec![value]).into_any();
                let mut writer = ty.create_column_writer("t", &column).unwrap();
                write_column(writer.as_mut())
            };
            for value in [first, last] {
                let bytes = write(value).unwrap();
                let decoded = read_column(ty.create_plain_reader(1).unwrap(), &bytes).unwrap();
                assert_eq!(decoded.value(0).unwrap(), Value::DateTime(value), "{precision}");
            }

            let tick = TimeDelta::nanoseconds(10i64.pow(9 - precision));
            for value in [first - tick, last + tick] {
                let err = write(value).unwrap_err();
                match err.kind() {
                    ErrorKind::Overflow { message } => {
                        assert!(message.contains(&format!("DateTime64({precision})")), "{message}")
                    }
                    _ => panic!("unexpected error kind for {value} at {precision}"),
                }
            }
        }

        let ty = DateTime64Type::new(9, Some("UTC")).unwrap();
        let column = PrimitiveColumn::new(vec![utc(2270, 1, 1, 0, 0, 0, 0)]).into_any();
        let mut writer = ty.create_column_writer("t", &column).unwrap();
        let err = write_column(writer.as_mut()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Overflow { .. }));
    }

    #[test]
    fn test_datetime_before_epoch_overflows() {
        let ty = DateTimeType::new(None).unwrap();
        let value = Tz::UTC.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap();
        let column = PrimitiveColumn::new(vec![value]).into_any();
        let mut writer = ty.create_column_writer("t", &column).unwrap();
        let err = write_column(writer.as_mut()).unwrap_err();
        match err.kind() {
            ErrorKind::Overflow { message } => assert!(message.contains(DATETIME_RANGE)),
            _ => panic!("unexpected error kind"),
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(DateTime64Type::new(10, None).is_err());
        assert!(DateTimeType::new(Some("Mars/Olympus")).is_err());
    }
}
