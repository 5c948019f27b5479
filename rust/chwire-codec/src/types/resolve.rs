//! Maps parsed type names onto descriptors.

use std::sync::Arc;

use chwire_common::{Result, error::Error};

use super::composite::{ArrayType, MapType, NullableType, TupleType, VariantType};
use super::datetime::{DateTime64Type, DateTimeType};
use super::decimal::DecimalType;
use super::enums::EnumType;
use super::scalar::ScalarType;
use super::string::{FixedStringType, StringType};
use super::{ColumnType, TypeArg, TypeName};

/// Type families the codec recognizes but cannot decode.
const UNSUPPORTED: &[&str] = &[
    "LowCardinality",
    "Decimal256",
    "Int256",
    "UInt256",
    "Nested",
    "Object",
    "JSON",
    "Dynamic",
    "AggregateFunction",
    "SimpleAggregateFunction",
];

/// Builds the descriptor for `name`, recursively for its type arguments.
pub fn build_type(name: &TypeName) -> Result<Arc<dyn ColumnType>> {
    let family = name.name.as_str();
    if let Some(scalar) = ScalarType::from_name(family) {
        expect_arity(name, 0..=0)?;
        return Ok(Arc::new(scalar));
    }
    let ty: Arc<dyn ColumnType> = match family {
        "String" => {
            expect_arity(name, 0..=0)?;
            Arc::new(StringType)
        }
        "FixedString" => {
            expect_arity(name, 1..=1)?;
            let size = unsigned_arg(name, &name.args[0])?;
            Arc::new(FixedStringType::new(size as usize)?)
        }
        "DateTime" => {
            expect_arity(name, 0..=1)?;
            let tz = name.args.first().map(|arg| string_arg(name, arg)).transpose()?;
            Arc::new(DateTimeType::new(tz)?)
        }
        "DateTime64" => {
            expect_arity(name, 1..=2)?;
            let precision = unsigned_arg(name, &name.args[0])?;
            let tz = name.args.get(1).map(|arg| string_arg(name, arg)).transpose()?;
            Arc::new(DateTime64Type::new(precision, tz)?)
        }
        "Decimal" => {
            expect_arity(name, 1..=2)?;
            let precision = unsigned_arg(name, &name.args[0])?;
            let scale = match name.args.get(1) {
                Some(arg) => unsigned_arg(name, arg)?,
                None => 0,
            };
            Arc::new(DecimalType::new(precision, scale)?)
        }
        "Decimal32" | "Decimal64" | "Decimal128" => {
            expect_arity(name, 1..=1)?;
            let precision = match family {
                "Decimal32" => 9,
                "Decimal64" => 18,
                _ => 38,
            };
            let scale = unsigned_arg(name, &name.args[0])?;
            Arc::new(DecimalType::new(precision, scale)?)
        }
        "Enum8" | "Enum16" => {
            let members = enum_members(name)?;
            if family == "Enum8" {
                Arc::new(EnumType::enum8(members)?)
            } else {
                Arc::new(EnumType::enum16(members)?)
            }
        }
        "Nullable" => {
            expect_arity(name, 1..=1)?;
            Arc::new(NullableType::new(type_arg(name, &name.args[0])?)?)
        }
        "Array" => {
            expect_arity(name, 1..=1)?;
            Arc::new(ArrayType::new(type_arg(name, &name.args[0])?))
        }
        "Map" => {
            expect_arity(name, 2..=2)?;
            let key = type_arg(name, &name.args[0])?;
            let value = type_arg(name, &name.args[1])?;
            Arc::new(MapType::new(key, value)?)
        }
        "Tuple" => Arc::new(tuple_type(name)?),
        "Variant" => {
            let variants = name
                .args
                .iter()
                .map(|arg| type_arg(name, arg))
                .collect::<Result<Vec<_>>>()?;
            Arc::new(VariantType::new(variants)?)
        }
        _ if UNSUPPORTED.contains(&family) => {
            return Err(Error::not_supported(format!("column type {name}")));
        }
        _ => {
            return Err(Error::invalid_arg(
                "type_name",
                format!("unknown type {name}"),
            ));
        }
    };
    Ok(ty)
}

fn bad_argument(name: &TypeName, expected: &str) -> Error {
    Error::invalid_arg("type_name", format!("{name}: expected {expected}"))
}

fn expect_arity(name: &TypeName, arity: std::ops::RangeInclusive<usize>) -> Result<()> {
    if arity.contains(&name.args.len()) {
        return Ok(());
    }
    let expected = if arity.start() == arity.end() {
        format!("{} arguments", arity.start())
    } else {
        format!("{} to {} arguments", arity.start(), arity.end())
    };
    Err(bad_argument(name, &expected))
}

fn type_arg(name: &TypeName, arg: &TypeArg) -> Result<Arc<dyn ColumnType>> {
    match arg {
        TypeArg::Type(inner) => build_type(inner),
        _ => Err(bad_argument(name, "a type argument")),
    }
}

fn unsigned_arg(name: &TypeName, arg: &TypeArg) -> Result<u32> {
    match arg {
        TypeArg::Number(n) => {
            u32::try_from(*n).map_err(|_| bad_argument(name, "a non-negative number"))
        }
        _ => Err(bad_argument(name, "a number")),
    }
}

fn string_arg<'a>(name: &TypeName, arg: &'a TypeArg) -> Result<&'a str> {
    match arg {
        TypeArg::String(s) => Ok(s),
        _ => Err(bad_argument(name, "a quoted string")),
    }
}

fn enum_members(name: &TypeName) -> Result<Vec<(String, i16)>> {
    if name.args.is_empty() {
        return Err(bad_argument(name, "at least one enum member"));
    }
    name.args
        .iter()
        .map(|arg| match arg {
            TypeArg::EnumMember(member, value) => i16::try_from(*value)
                .map(|value| (member.clone(), value))
                .map_err(|_| bad_argument(name, "enum values within the Int16 range")),
            _ => Err(bad_argument(name, "'name' = value enum members")),
        })
        .collect()
}

/// Tuples are either all named or all positional.
fn tuple_type(name: &TypeName) -> Result<TupleType> {
    if name.args.iter().all(|arg| matches!(arg, TypeArg::Named(..))) && !name.args.is_empty() {
        let elements = name
            .args
            .iter()
            .map(|arg| match arg {
                TypeArg::Named(element, ty) => Ok((element.clone(), build_type(ty)?)),
                _ => Err(bad_argument(name, "named elements")),
            })
            .collect::<Result<Vec<_>>>()?;
        return TupleType::named(elements);
    }
    let elements = name
        .args
        .iter()
        .map(|arg| type_arg(name, arg))
        .collect::<Result<Vec<_>>>()?;
    TupleType::new(elements)
}
