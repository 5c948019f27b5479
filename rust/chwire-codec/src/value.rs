//! Values carried by columns, and the traits tying Rust types to wire value kinds.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use itertools::Itertools;
use uuid::Uuid;

use crate::column::{AnyColumn, ColumnRef, OptionalColumn};
use crate::decimal::Decimal;

/// Invokes `$callback!` with the `(variant, type)` list of every scalar value kind.
///
/// The list drives the variants of [`AnyColumn`] and the [`ScalarValue`]
/// implementations, so that both always agree.
macro_rules! for_each_scalar {
    ($callback:ident) => {
        $callback! {
            (Bool, bool),
            (Int8, i8),
            (Int16, i16),
            (Int32, i32),
            (Int64, i64),
            (Int128, i128),
            (UInt8, u8),
            (UInt16, u16),
            (UInt32, u32),
            (UInt64, u64),
            (UInt128, u128),
            (Float32, f32),
            (Float64, f64),
            (Decimal, $crate::decimal::Decimal),
            (String, ::std::string::String),
            (Bytes, ::bytes::Bytes),
            (Uuid, ::uuid::Uuid),
            (Ipv4, ::std::net::Ipv4Addr),
            (Ipv6, ::std::net::Ipv6Addr),
            (IpAddr, ::std::net::IpAddr),
            (Date, ::chrono::NaiveDate),
            (DateTime, ::chrono::DateTime<::chrono_tz::Tz>),
        }
    };
}
pub(crate) use for_each_scalar;

/// The in-memory value type a column exposes.
///
/// Several wire types share one kind: `Date` and `Date32` both expose
/// [`ValueKind::Date`], `Enum8`/`Enum16` expose [`ValueKind::String`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nothing,
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
    Decimal,
    String,
    Bytes,
    Uuid,
    Ipv4,
    Ipv6,
    IpAddr,
    Date,
    DateTime,
    Array(Box<ValueKind>),
    Tuple(Vec<ValueKind>),
    Variant(Vec<ValueKind>),
}

impl ValueKind {
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            ValueKind::Array(_) | ValueKind::Tuple(_) | ValueKind::Variant(_)
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Array(element) => write!(f, "Array({element})"),
            ValueKind::Tuple(elements) => write!(f, "Tuple({})", elements.iter().join(", ")),
            ValueKind::Variant(variants) => {
                write!(f, "Variant({})", variants.iter().join(", "))
            }
            scalar => fmt::Debug::fmt(scalar, f),
        }
    }
}

/// A single dynamically typed row value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Bytes),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    IpAddr(IpAddr),
    Date(NaiveDate),
    DateTime(DateTime<Tz>),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A Rust type that can be the value type of a [`crate::column::Column`].
pub trait ColumnValue: Clone + Send + Sync + 'static {
    fn into_value(self) -> Value;

    /// Views an erased column as a column of `Self`, reinterpreting it when the
    /// column's own kind differs but converts losslessly.
    fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>>;
}

/// A [`ColumnValue`] that corresponds to exactly one [`AnyColumn`] variant.
pub trait ScalarValue: ColumnValue + PartialEq + fmt::Debug {
    const KIND: ValueKind;

    fn wrap(column: ColumnRef<Self>) -> AnyColumn;

    fn unwrap(column: &AnyColumn) -> Option<&ColumnRef<Self>>;
}

macro_rules! impl_scalar_value {
    ($(($variant:ident, $ty:ty)),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>> {
                    match column.try_reinterpret(&ValueKind::$variant)? {
                        AnyColumn::$variant(column) => Some(column),
                        _ => None,
                    }
                }
            }

            impl ScalarValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn wrap(column: ColumnRef<Self>) -> AnyColumn {
                    AnyColumn::$variant(column)
                }

                fn unwrap(column: &AnyColumn) -> Option<&ColumnRef<Self>> {
                    match column {
                        AnyColumn::$variant(column) => Some(column),
                        _ => None,
                    }
                }
            }
        )*
    };
}

for_each_scalar!(impl_scalar_value);

/// `Nothing` columns carry no data; every row is null.
impl ColumnValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }

    fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>> {
        match column {
            AnyColumn::Nothing(column) => Some(column.clone()),
            _ => None,
        }
    }
}

impl ScalarValue for () {
    const KIND: ValueKind = ValueKind::Nothing;

    fn wrap(column: ColumnRef<Self>) -> AnyColumn {
        AnyColumn::Nothing(column)
    }

    fn unwrap(column: &AnyColumn) -> Option<&ColumnRef<Self>> {
        match column {
            AnyColumn::Nothing(column) => Some(column),
            _ => None,
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, ColumnValue::into_value)
    }

    fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>> {
        let inner = T::from_any(column)?;
        let optional: ColumnRef<Self> = Arc::new(OptionalColumn::new(inner));
        Some(optional)
    }
}

impl<T: ColumnValue> ColumnValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(ColumnValue::into_value).collect())
    }

    fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>> {
        match column {
            AnyColumn::Array(array) => {
                let typed: ColumnRef<Self> = Arc::new(array.typed::<T>()?);
                Some(typed)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_display() {
        let kind = ValueKind::Array(Box::new(ValueKind::Tuple(vec![
            ValueKind::String,
            ValueKind::Int32,
        ])));
        assert_eq!(kind.to_string(), "Array(Tuple(String, Int32))");
        assert!(!kind.is_scalar());
        assert!(ValueKind::Uuid.is_scalar());
    }

    #[test]
    fn test_into_value() {
        assert_eq!(5i16.into_value(), Value::Int16(5));
        assert_eq!(None::<u8>.into_value(), Value::Null);
        assert_eq!(Some(7u8).into_value(), Value::UInt8(7));
        assert_eq!(
            vec![1i32, 2].into_value(),
            Value::Array(vec![Value::Int32(1), Value::Int32(2)])
        );
        assert!(().into_value().is_null());
    }
}
