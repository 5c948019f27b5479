use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::NaiveDate;
use chwire_common::{Result, error::Error};
use uuid::Uuid;

use crate::column::date::{
    DATE_RANGE, DATE32_MAX_DAYS, DATE32_MIN_DAYS, DATE32_RANGE, DateColumn, date_to_days,
};
use crate::column::net::Ipv4Column;
use crate::column::{AnyColumn, NothingColumn, PrimitiveColumn};
use crate::reader::fixed::{FixedColumnReader, FixedSkipReader, WireElement};
use crate::reader::{ColumnReader, SkippingColumnReader};
use crate::value::{ScalarValue, ValueKind};
use crate::writer::{ColumnWriter, FixedColumnWriter, require};

use super::{ColumnType, TypeName};

/// Fixed-width types without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    Float32,
    Float64,
    Uuid,
    Ipv4,
    Ipv6,
    Date,
    Date32,
    Nothing,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<ScalarType> {
        let ty = match name {
            "Bool" | "Boolean" => ScalarType::Bool,
            "Int8" => ScalarType::Int8,
            "Int16" => ScalarType::Int16,
            "Int32" => ScalarType::Int32,
            "Int64" => ScalarType::Int64,
            "Int128" => ScalarType::Int128,
            "UInt8" => ScalarType::UInt8,
            "UInt16" => ScalarType::UInt16,
            "UInt32" => ScalarType::UInt32,
            "UInt64" => ScalarType::UInt64,
            "UInt128" => ScalarType::UInt128,
            "Float32" => ScalarType::Float32,
            "Float64" => ScalarType::Float64,
            "UUID" => ScalarType::Uuid,
            "IPv4" => ScalarType::Ipv4,
            "IPv6" => ScalarType::Ipv6,
            "Date" => ScalarType::Date,
            "Date32" => ScalarType::Date32,
            "Nothing" => ScalarType::Nothing,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "Bool",
            ScalarType::Int8 => "Int8",
            ScalarType::Int16 => "Int16",
            ScalarType::Int32 => "Int32",
            ScalarType::Int64 => "Int64",
            ScalarType::Int128 => "Int128",
            ScalarType::UInt8 => "UInt8",
            ScalarType::UInt16 => "UInt16",
            ScalarType::UInt32 => "UInt32",
            ScalarType::UInt64 => "UInt64",
            ScalarType::UInt128 => "UInt128",
            ScalarType::Float32 => "Float32",
            ScalarType::Float64 => "Float64",
            ScalarType::Uuid => "UUID",
            ScalarType::Ipv4 => "IPv4",
            ScalarType::Ipv6 => "IPv6",
            ScalarType::Date => "Date",
            ScalarType::Date32 => "Date32",
            ScalarType::Nothing => "Nothing",
        }
    }

    /// Bytes per row on the wire.
    pub fn element_size(&self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::Int8 | ScalarType::UInt8 | ScalarType::Nothing => 1,
            ScalarType::Int16 | ScalarType::UInt16 | ScalarType::Date => 2,
            ScalarType::Int32
            | ScalarType::UInt32
            | ScalarType::Float32
            | ScalarType::Ipv4
            | ScalarType::Date32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
            ScalarType::Int128 | ScalarType::UInt128 | ScalarType::Uuid | ScalarType::Ipv6 => 16,
        }
    }
}

/// Reader for numbers whose wire element is also the value type.
fn numeric_reader<T>(row_count: usize) -> Box<dyn ColumnReader>
where
    T: WireElement + ScalarValue + Default,
{
    Box::new(FixedColumnReader::<T>::new(row_count, |values| {
        Ok(PrimitiveColumn::zero_default(values).into_any())
    }))
}

fn numeric_writer<T>(ty: &ScalarType, name: &str, column: &AnyColumn) -> Result<Box<dyn ColumnWriter>>
where
    T: WireElement + ScalarValue,
{
    let source = require::<T>(ty, name, column)?;
    Ok(Box::new(FixedColumnWriter::new(name, source, Ok::<T, Error>)))
}

impl ColumnType for ScalarType {
    fn type_name(&self) -> TypeName {
        TypeName::new(self.name())
    }

    fn value_kind(&self) -> ValueKind {
        match self {
            ScalarType::Bool => ValueKind::Bool,
            ScalarType::Int8 => ValueKind::Int8,
            ScalarType::Int16 => ValueKind::Int16,
            ScalarType::Int32 => ValueKind::Int32,
            ScalarType::Int64 => ValueKind::Int64,
            ScalarType::Int128 => ValueKind::Int128,
            ScalarType::UInt8 => ValueKind::UInt8,
            ScalarType::UInt16 => ValueKind::UInt16,
            ScalarType::UInt32 => ValueKind::UInt32,
            ScalarType::UInt64 => ValueKind::UInt64,
            ScalarType::UInt128 => ValueKind::UInt128,
            ScalarType::Float32 => ValueKind::Float32,
            ScalarType::Float64 => ValueKind::Float64,
            ScalarType::Uuid => ValueKind::Uuid,
            ScalarType::Ipv4 => ValueKind::Ipv4,
            ScalarType::Ipv6 => ValueKind::Ipv6,
            ScalarType::Date | ScalarType::Date32 => ValueKind::Date,
            ScalarType::Nothing => ValueKind::Nothing,
        }
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        let reader: Box<dyn ColumnReader> = match self {
            ScalarType::Bool => Box::new(FixedColumnReader::<u8>::new(row_count, |raw| {
                let values: Vec<bool> = raw.into_iter().map(|b| b != 0).collect();
                Ok(PrimitiveColumn::zero_default(values).into_any())
            })),
            ScalarType::Int8 => numeric_reader::<i8>(row_count),
            ScalarType::Int16 => numeric_reader::<i16>(row_count),
            ScalarType::Int32 => numeric_reader::<i32>(row_count),
            ScalarType::Int64 => numeric_reader::<i64>(row_count),
            ScalarType::Int128 => numeric_reader::<i128>(row_count),
            ScalarType::UInt8 => numeric_reader::<u8>(row_count),
            ScalarType::UInt16 => numeric_reader::<u16>(row_count),
            ScalarType::UInt32 => numeric_reader::<u32>(row_count),
            ScalarType::UInt64 => numeric_reader::<u64>(row_count),
            ScalarType::UInt128 => numeric_reader::<u128>(row_count),
            ScalarType::Float32 => numeric_reader::<f32>(row_count),
            ScalarType::Float64 => numeric_reader::<f64>(row_count),
            ScalarType::Uuid => Box::new(FixedColumnReader::<[u64; 2]>::new(row_count, |raw| {
                let values: Vec<Uuid> = raw
                    .into_iter()
                    .map(|[high, low]| Uuid::from_u64_pair(high, low))
                    .collect();
                Ok(PrimitiveColumn::zero_default(values).into_any())
            })),
            ScalarType::Ipv4 => Box::new(FixedColumnReader::<u32>::new(row_count, |raw| {
                Ok(Ipv4Column::new(raw).into_any())
            })),
            ScalarType::Ipv6 => Box::new(FixedColumnReader::<[u8; 16]>::new(row_count, |raw| {
                let values: Vec<Ipv6Addr> = raw.into_iter().map(Ipv6Addr::from).collect();
                Ok(PrimitiveColumn::new(values)
                    .with_default(Ipv6Addr::UNSPECIFIED)
                    .into_any())
            })),
            ScalarType::Date => Box::new(FixedColumnReader::<u16>::new(row_count, |raw| {
                Ok(DateColumn::new(raw).into_any())
            })),
            ScalarType::Date32 => Box::new(FixedColumnReader::<i32>::new(row_count, |raw| {
                Ok(DateColumn::new(raw).into_any())
            })),
            ScalarType::Nothing => Box::new(FixedColumnReader::<u8>::new(row_count, |raw| {
                Ok(NothingColumn::new(raw.len()).into_any())
            })),
        };
        Ok(reader)
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(FixedSkipReader::new(row_count, self.element_size())))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        match self {
            ScalarType::Nothing => None,
            _ => Some((self.boxed(), false)),
        }
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let writer: Box<dyn ColumnWriter> = match self {
            ScalarType::Bool => {
                let source = require::<bool>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: bool| Ok(u8::from(v))))
            }
            ScalarType::Int8 => numeric_writer::<i8>(self, name, column)?,
            ScalarType::Int16 => numeric_writer::<i16>(self, name, column)?,
            ScalarType::Int32 => numeric_writer::<i32>(self, name, column)?,
            ScalarType::Int64 => numeric_writer::<i64>(self, name, column)?,
            ScalarType::Int128 => numeric_writer::<i128>(self, name, column)?,
            ScalarType::UInt8 => numeric_writer::<u8>(self, name, column)?,
            ScalarType::UInt16 => numeric_writer::<u16>(self, name, column)?,
            ScalarType::UInt32 => numeric_writer::<u32>(self, name, column)?,
            ScalarType::UInt64 => numeric_writer::<u64>(self, name, column)?,
            ScalarType::UInt128 => numeric_writer::<u128>(self, name, column)?,
            ScalarType::Float32 => numeric_writer::<f32>(self, name, column)?,
            ScalarType::Float64 => numeric_writer::<f64>(self, name, column)?,
            ScalarType::Uuid => {
                let source = require::<Uuid>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: Uuid| {
                    let (high, low) = v.as_u64_pair();
                    Ok([high, low])
                }))
            }
            ScalarType::Ipv4 => {
                let source = require::<Ipv4Addr>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: Ipv4Addr| {
                    Ok(u32::from(v))
                }))
            }
            ScalarType::Ipv6 => {
                let source = require::<Ipv6Addr>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: Ipv6Addr| Ok(v.octets())))
            }
            ScalarType::Date => {
                let source = require::<NaiveDate>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: NaiveDate| {
                    u16::try_from(date_to_days(v)).map_err(|_| {
                        Error::overflow(format!("Date value must be within {DATE_RANGE}, got {v}"))
                    })
                }))
            }
            ScalarType::Date32 => {
                let source = require::<NaiveDate>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |v: NaiveDate| {
                    let days = date_to_days(v);
                    if !(DATE32_MIN_DAYS..=DATE32_MAX_DAYS).contains(&days) {
                        return Err(Error::overflow(format!(
                            "Date32 value must be within {DATE32_RANGE}, got {v}"
                        )));
                    }
                    Ok(days as i32)
                }))
            }
            ScalarType::Nothing => {
                let source = require::<()>(self, name, column)?;
                Box::new(FixedColumnWriter::new(name, source, |_: ()| Ok(b'0')).with_null_value(b'0'))
            }
        };
        Ok(writer)
    }
}
