//! Reinterpretation of decoded columns as different, compatible value kinds.
//!
//! A request is resolved in order:
//!
//! 1. composites map their children and keep their shape; variants decline;
//! 2. a request for the column's own kind returns the column itself;
//! 3. the column's own [`crate::column::Column::reinterpret`] override;
//! 4. the conversion table below.
//!
//! The table only lists value-preserving conversions. Integers widen into wider
//! integers of either signedness when every value fits, and into floats when the
//! mantissa holds every value exactly.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use uuid::Uuid;

use crate::column::{AnyColumn, NothingColumn, PrimitiveColumn, map_column};
use crate::value::{ValueKind, for_each_scalar};

pub fn try_reinterpret(column: &AnyColumn, target: &ValueKind) -> Option<AnyColumn> {
    match (column, target) {
        (AnyColumn::Array(array), ValueKind::Array(element)) => {
            return array.reinterpret_elements(element).map(AnyColumn::Array);
        }
        (AnyColumn::Tuple(tuple), ValueKind::Tuple(kinds)) => {
            return tuple.reinterpret_children(kinds).map(AnyColumn::Tuple);
        }
        (AnyColumn::Array(_) | AnyColumn::Tuple(_) | AnyColumn::Variant(_), _) => return None,
        _ => {}
    }
    if column.kind() == *target {
        return Some(column.clone());
    }
    if let Some(column) = column.reinterpret_override(target) {
        return Some(column);
    }
    convert(column, target)
}

macro_rules! widening_table {
    ($column:expr, $target:expr, { $($src:ident => [$($dst:ident),* $(,)?]),* $(,)? }) => {
        match ($column, $target) {
            $($(
                (AnyColumn::$src(column), ValueKind::$dst) => {
                    return Some(AnyColumn::$dst(map_column(column.clone(), |v| Ok(From::from(v)))));
                }
            )*)*
            _ => {}
        }
    };
}

fn convert(column: &AnyColumn, target: &ValueKind) -> Option<AnyColumn> {
    widening_table!(column, target, {
        Bool => [UInt8],
        Int8 => [Int16, Int32, Int64, Int128, Float32, Float64, Decimal],
        Int16 => [Int32, Int64, Int128, Float32, Float64, Decimal],
        Int32 => [Int64, Int128, Float64, Decimal],
        Int64 => [Int128, Decimal],
        UInt8 => [
            UInt16, UInt32, UInt64, UInt128, Int16, Int32, Int64, Int128, Float32, Float64,
            Decimal,
        ],
        UInt16 => [UInt32, UInt64, UInt128, Int32, Int64, Int128, Float32, Float64, Decimal],
        UInt32 => [UInt64, UInt128, Int64, Int128, Float64, Decimal],
        UInt64 => [UInt128, Int128, Decimal],
        Float32 => [Float64],
        String => [Bytes],
        Ipv4 => [IpAddr, UInt32],
        Ipv6 => [IpAddr],
    });

    match (column, target) {
        (AnyColumn::Ipv4(column), ValueKind::Int32) => Some(AnyColumn::Int32(map_column(
            column.clone(),
            |v: Ipv4Addr| Ok(u32::from(v) as i32),
        ))),
        (AnyColumn::Ipv4(column), ValueKind::String) => Some(AnyColumn::String(map_column(
            column.clone(),
            |v: Ipv4Addr| Ok(v.to_string()),
        ))),
        (AnyColumn::Ipv6(column), ValueKind::String) => Some(AnyColumn::String(map_column(
            column.clone(),
            |v: Ipv6Addr| Ok(v.to_string()),
        ))),
        (AnyColumn::IpAddr(column), ValueKind::String) => Some(AnyColumn::String(map_column(
            column.clone(),
            |v: IpAddr| Ok(v.to_string()),
        ))),
        (AnyColumn::Uuid(column), ValueKind::String) => Some(AnyColumn::String(map_column(
            column.clone(),
            |v: Uuid| Ok(v.to_string()),
        ))),
        _ => None,
    }
}

/// Whether `from` columns can always be viewed as `to`, without looking at a
/// concrete column. Column-specific overrides may offer more.
pub fn is_convertible(from: &ValueKind, to: &ValueKind) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (ValueKind::Array(from), ValueKind::Array(to)) => is_convertible(from, to),
        (ValueKind::Tuple(from), ValueKind::Tuple(to)) => {
            from.len() == to.len() && from.iter().zip(to).all(|(f, t)| is_convertible(f, t))
        }
        (ValueKind::Variant(_), _) | (_, ValueKind::Variant(_)) => false,
        _ => probe(from, to),
    }
}

fn probe(from: &ValueKind, to: &ValueKind) -> bool {
    empty_column(from).is_some_and(|column| convert(&column, to).is_some())
}

macro_rules! empty_scalar_column {
    ($(($variant:ident, $ty:ty)),* $(,)?) => {
        fn empty_column(kind: &ValueKind) -> Option<AnyColumn> {
            match kind {
                ValueKind::Nothing => Some(NothingColumn::new(0).into_any()),
                $(ValueKind::$variant => Some(PrimitiveColumn::<$ty>::new(Vec::new()).into_any()),)*
                _ => None,
            }
        }
    };
}

for_each_scalar!(empty_scalar_column);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::string::StringColumn;
    use crate::value::Value;
    use bytes::Bytes;

    #[test]
    fn test_int16_widening() {
        let values: Vec<i16> = (0..200).map(|_| fastrand::i16(..)).collect();
        let column = PrimitiveColumn::new(values.clone()).into_any();
        let widened = column.try_reinterpret_as::<i32>().unwrap();
        assert_eq!(widened.row_count(), values.len());
        for (i, v) in values.iter().enumerate() {
            assert_eq!(widened.value(i).unwrap(), i32::from(*v));
        }
    }

    #[test]
    fn test_lossy_targets_are_declined() {
        let column = PrimitiveColumn::new(vec![1i16]).into_any();
        assert!(column.try_reinterpret(&ValueKind::String).is_none());
        assert!(column.try_reinterpret(&ValueKind::Int8).is_none());
        assert!(column.try_reinterpret(&ValueKind::UInt16).is_none());

        let wide = PrimitiveColumn::new(vec![1i64]).into_any();
        assert!(wide.try_reinterpret(&ValueKind::Float64).is_none());
        let float = PrimitiveColumn::new(vec![1f64]).into_any();
        assert!(float.try_reinterpret(&ValueKind::Float32).is_none());
    }

    #[test]
    fn test_reinterpretation_is_idempotent() {
        let column = PrimitiveColumn::new(vec![3u8, 250]).into_any();
        let first = column.try_reinterpret(&ValueKind::Int16).unwrap();
        let second = column.try_reinterpret(&ValueKind::Int16).unwrap();
        assert_eq!(first.values().unwrap(), second.values().unwrap());
        assert_eq!(column.values().unwrap(), vec![Value::UInt8(3), Value::UInt8(250)]);
        let same = first.try_reinterpret(&ValueKind::Int16).unwrap();
        assert_eq!(same.values().unwrap(), first.values().unwrap());
    }

    #[test]
    fn test_string_to_bytes() {
        let column = StringColumn::from_strings(["héllo"]).into_any();
        let bytes = column.try_reinterpret_as::<Bytes>().unwrap();
        assert_eq!(bytes.value(0).unwrap(), Bytes::from("héllo"));
    }

    #[test]
    fn test_uuid_to_string() {
        let id = Uuid::from_u64_pair(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210);
        let column = PrimitiveColumn::new(vec![id]).into_any();
        let text = column.try_reinterpret_as::<String>().unwrap();
        assert_eq!(text.value(0).unwrap(), "01234567-89ab-cdef-fedc-ba9876543210");
    }

    #[test]
    fn test_optional_view() {
        let column = PrimitiveColumn::new(vec![5u16]).into_any();
        let optional = column.try_reinterpret_as::<Option<u32>>().unwrap();
        assert_eq!(optional.value(0).unwrap(), Some(5));
    }

    #[test]
    fn test_kind_convertibility() {
        assert!(is_convertible(&ValueKind::Int16, &ValueKind::Int32));
        assert!(is_convertible(&ValueKind::UInt32, &ValueKind::Decimal));
        assert!(!is_convertible(&ValueKind::Int16, &ValueKind::String));
        assert!(is_convertible(
            &ValueKind::Array(Box::new(ValueKind::Float32)),
            &ValueKind::Array(Box::new(ValueKind::Float64))
        ));
        assert!(!is_convertible(
            &ValueKind::Tuple(vec![ValueKind::Int8]),
            &ValueKind::Tuple(vec![ValueKind::Int8, ValueKind::Int8])
        ));
    }
}
