use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::column::AnyColumn;
use crate::column::decimal::DecimalColumn;
use crate::decimal::Decimal;
use crate::reader::fixed::{FixedColumnReader, FixedSkipReader, WireElement};
use crate::reader::{ColumnReader, SkippingColumnReader};
use crate::value::ValueKind;
use crate::writer::{ColumnWriter, FixedColumnWriter, require};

use super::{ColumnType, TypeArg, TypeName};

pub const MAX_PRECISION: u32 = 38;

/// Precision of `Decimal256`, which has no reader.
pub const DECIMAL256_PRECISION: u32 = 76;

/// `Decimal(P, S)`: a two's-complement integer of 4, 8 or 16 bytes by precision,
/// scaled by `10^-S`.
#[derive(Debug, Clone, Copy)]
pub struct DecimalType {
    precision: u32,
    scale: u32,
}

impl DecimalType {
    pub fn new(precision: u32, scale: u32) -> Result<DecimalType> {
        if precision > MAX_PRECISION && precision <= DECIMAL256_PRECISION {
            return Err(Error::not_supported(format!(
                "Decimal({precision}, {scale}) needs 256-bit storage"
            )));
        }
        if !(1..=MAX_PRECISION).contains(&precision) {
            return Err(Error::invalid_arg(
                "precision",
                format!("decimal precision {precision} is out of range 1..={MAX_PRECISION}"),
            ));
        }
        if scale > precision {
            return Err(Error::invalid_arg(
                "scale",
                format!("decimal scale {scale} exceeds precision {precision}"),
            ));
        }
        Ok(DecimalType { precision, scale })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Bytes per value on the wire.
    pub fn element_size(&self) -> usize {
        match self.precision {
            0..=9 => 4,
            10..=18 => 8,
            _ => 16,
        }
    }

    fn reader<R>(&self, row_count: usize) -> Box<dyn ColumnReader>
    where
        R: WireElement + crate::column::decimal::DecimalRaw,
    {
        let scale = self.scale;
        Box::new(FixedColumnReader::<R>::new(row_count, move |raw| {
            Ok(DecimalColumn::new(raw, scale).into_any())
        }))
    }

    fn writer<R>(&self, name: &str, column: &AnyColumn) -> Result<Box<dyn ColumnWriter>>
    where
        R: WireElement + TryFrom<i128>,
    {
        let source = require::<Decimal>(self, name, column)?;
        let (precision, scale) = (self.precision, self.scale);
        let limit = 10i128.pow(precision);
        Ok(Box::new(FixedColumnWriter::new(name, source, move |v: Decimal| {
            let raw = v.rescale(scale)?;
            if raw.unsigned_abs() >= limit as u128 {
                return Err(Error::overflow(format!(
                    "{v} does not fit Decimal({precision}, {scale}): at most {precision} digits"
                )));
            }
            R::try_from(raw).map_err(|_| {
                Error::overflow(format!("{v} does not fit Decimal({precision}, {scale})"))
            })
        })))
    }
}

impl ColumnType for DecimalType {
    fn type_name(&self) -> TypeName {
        TypeName::with_args(
            "Decimal",
            vec![
                TypeArg::Number(i64::from(self.precision)),
                TypeArg::Number(i64::from(self.scale)),
            ],
        )
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Decimal
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(match self.element_size() {
            4 => self.reader::<i32>(row_count),
            8 => self.reader::<i64>(row_count),
            _ => self.reader::<i128>(row_count),
        })
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(FixedSkipReader::new(row_count, self.element_size())))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        match self.element_size() {
            4 => self.writer::<i32>(name, column),
            8 => self.writer::<i64>(name, column),
            _ => self.writer::<i128>(name, column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;
    use crate::reader::read_column;
    use crate::writer::write_column;
    use chwire_common::error::ErrorKind;

    fn round_trip(ty: &DecimalType, values: Vec<Decimal>) -> Result<Vec<Decimal>> {
        let column = PrimitiveColumn::new(values).into_any();
        let mut writer = ty.create_column_writer("d", &column)?;
        let bytes = write_column(writer.as_mut())?;
        assert_eq!(bytes.len(), column.row_count() * ty.element_size());
        let decoded = read_column(ty.create_plain_reader(column.row_count())?, &bytes)?;
        let typed = decoded.try_reinterpret_as::<Decimal>().unwrap();
        (0..typed.row_count()).map(|i| typed.value(i)).collect()
    }

    #[test]
    fn test_widths_by_precision() {
        for (precision, size) in [(9, 4), (18, 8), (38, 16)] {
            let ty = DecimalType::new(precision, 2).unwrap();
            assert_eq!(ty.element_size(), size);
            let values = vec!["-1.5".parse().unwrap(), "123.45".parse().unwrap()];
            let decoded = round_trip(&ty, values).unwrap();
            assert_eq!(decoded[0].rescale(2).unwrap(), -150);
            assert_eq!(decoded[1].to_string(), "123.45");
        }
    }

    #[test]
    fn test_precision_overflow_and_lost_digits() {
        let ty = DecimalType::new(5, 2).unwrap();
        let err = round_trip(&ty, vec!["1000.00".parse().unwrap()]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Overflow { .. }));
        let err = round_trip(&ty, vec!["1.005".parse().unwrap()]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidCast { .. }));
    }

    #[test]
    fn test_integer_input() {
        let ty = DecimalType::new(18, 4).unwrap();
        let column = PrimitiveColumn::new(vec![7i32]).into_any();
        let mut writer = ty.create_column_writer("d", &column).unwrap();
        let bytes = write_column(writer.as_mut()).unwrap();
        assert_eq!(bytes, 70_000i64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(DecimalType::new(0, 0).is_err());
        assert!(DecimalType::new(10, 11).is_err());
        let err = DecimalType::new(76, 10).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotSupported { .. }));
    }
}
