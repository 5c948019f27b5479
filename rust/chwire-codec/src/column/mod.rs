//! Immutable, row-indexed columns and their erased representation.
//!
//! Every column implements [`Column<T>`] for its value type `T`. Decoded columns are
//! handed out as [`AnyColumn`], a closed enum over the scalar value kinds plus the
//! composite shapes (array, tuple, variant). Typed access is recovered either through
//! [`AnyColumn::try_reinterpret_as`] or through a [`ColumnDispatcher`].

use std::fmt;
use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::value::{ColumnValue, ScalarValue, Value, ValueKind, for_each_scalar};

pub mod array;
pub mod date;
pub mod decimal;
pub mod enums;
pub mod mapped;
pub mod net;
pub mod nothing;
pub mod nullable;
pub mod optional;
pub mod primitive;
pub mod sparse;
pub mod string;
pub mod tuple;
pub mod variant;

pub use array::{ArrayColumn, ArrayRange, TypedArrayColumn};
pub use mapped::{MappedColumn, map_column};
pub use nothing::NothingColumn;
pub use nullable::{NullableColumn, with_null_map};
pub use optional::OptionalColumn;
pub use primitive::PrimitiveColumn;
pub use sparse::SparseColumn;
pub use tuple::TupleColumn;
pub use variant::VariantColumn;

/// Read-only view over decoded rows of type `T`.
///
/// Callers are expected to pass `index < row_count()`; implementations report an
/// out-of-range index as an invalid-argument error rather than panicking.
pub trait Column<T>: Send + Sync {
    fn row_count(&self) -> usize;

    /// Returns the value at `index`. For a null row this is the underlying
    /// placeholder value, callers check [`Column::is_null`] first.
    fn value(&self, index: usize) -> Result<T>;

    fn is_null(&self, _index: usize) -> bool {
        false
    }

    /// The natural zero or empty value of the column type, if it has one.
    fn default_value(&self) -> Option<T> {
        None
    }

    /// The contiguous buffer backing the column, for columns stored as one.
    fn as_slice(&self) -> Option<&[T]> {
        None
    }

    /// Column-specific reinterpretation, consulted before the generic conversion
    /// table. Columns override this to offer zero-copy views of their raw storage.
    fn reinterpret(&self, _target: &ValueKind) -> Option<AnyColumn> {
        None
    }
}

pub type ColumnRef<T> = Arc<dyn Column<T>>;

/// A generic operation over a column whose value type is resolved at runtime.
pub trait ColumnDispatcher {
    type Output;

    fn dispatch<T: ScalarValue>(self, column: ColumnRef<T>) -> Self::Output;
}

macro_rules! define_any_column {
    ($(($variant:ident, $ty:ty)),* $(,)?) => {
        /// A column with its value type erased to one of the wire value kinds.
        #[derive(Clone)]
        pub enum AnyColumn {
            Nothing(ColumnRef<()>),
            $($variant(ColumnRef<$ty>),)*
            Array(ArrayColumn),
            Tuple(TupleColumn),
            Variant(VariantColumn),
        }

        impl AnyColumn {
            pub fn row_count(&self) -> usize {
                match self {
                    AnyColumn::Nothing(column) => column.row_count(),
                    $(AnyColumn::$variant(column) => column.row_count(),)*
                    AnyColumn::Array(column) => column.row_count(),
                    AnyColumn::Tuple(column) => column.row_count(),
                    AnyColumn::Variant(column) => column.row_count(),
                }
            }

            pub fn is_null(&self, index: usize) -> bool {
                match self {
                    AnyColumn::Nothing(column) => column.is_null(index),
                    $(AnyColumn::$variant(column) => column.is_null(index),)*
                    AnyColumn::Array(_) | AnyColumn::Tuple(_) => false,
                    AnyColumn::Variant(column) => column.is_null(index),
                }
            }

            /// Returns the row as a dynamic [`Value`], [`Value::Null`] for null rows.
            pub fn value(&self, index: usize) -> Result<Value> {
                match self {
                    AnyColumn::Nothing(_) => Ok(Value::Null),
                    $(AnyColumn::$variant(column) => scalar_value(column.as_ref(), index),)*
                    AnyColumn::Array(column) => column.value(index),
                    AnyColumn::Tuple(column) => column.value(index),
                    AnyColumn::Variant(column) => column.value(index),
                }
            }

            pub fn kind(&self) -> ValueKind {
                match self {
                    AnyColumn::Nothing(_) => ValueKind::Nothing,
                    $(AnyColumn::$variant(_) => ValueKind::$variant,)*
                    AnyColumn::Array(column) => {
                        ValueKind::Array(Box::new(column.elements().kind()))
                    }
                    AnyColumn::Tuple(column) => {
                        ValueKind::Tuple(column.children().iter().map(AnyColumn::kind).collect())
                    }
                    AnyColumn::Variant(column) => {
                        ValueKind::Variant(column.children().iter().map(AnyColumn::kind).collect())
                    }
                }
            }

            pub fn default_value(&self) -> Option<Value> {
                match self {
                    AnyColumn::Nothing(_) => Some(Value::Null),
                    $(AnyColumn::$variant(column) => {
                        column.default_value().map(ColumnValue::into_value)
                    })*
                    AnyColumn::Array(_) => Some(Value::Array(Vec::new())),
                    AnyColumn::Tuple(column) => column.default_value(),
                    AnyColumn::Variant(_) => Some(Value::Null),
                }
            }

            pub(crate) fn reinterpret_override(&self, target: &ValueKind) -> Option<AnyColumn> {
                match self {
                    AnyColumn::Nothing(column) => column.reinterpret(target),
                    $(AnyColumn::$variant(column) => column.reinterpret(target),)*
                    AnyColumn::Array(_) | AnyColumn::Tuple(_) | AnyColumn::Variant(_) => None,
                }
            }

            /// Invokes `dispatcher` with the statically typed column.
            ///
            /// Arrays, tuples and variants have no single value type and return `None`;
            /// use [`AnyColumn::as_array`] and friends for those.
            pub fn try_dispatch<D: ColumnDispatcher>(&self, dispatcher: D) -> Option<D::Output> {
                match self {
                    AnyColumn::Nothing(column) => Some(dispatcher.dispatch(column.clone())),
                    $(AnyColumn::$variant(column) => Some(dispatcher.dispatch(column.clone())),)*
                    AnyColumn::Array(_) | AnyColumn::Tuple(_) | AnyColumn::Variant(_) => None,
                }
            }
        }
    };
}

for_each_scalar!(define_any_column);

fn scalar_value<T: ColumnValue>(column: &dyn Column<T>, index: usize) -> Result<Value> {
    if column.is_null(index) {
        Ok(Value::Null)
    } else {
        column.value(index).map(ColumnValue::into_value)
    }
}

impl AnyColumn {
    /// Returns a view of this column exposing `target` values, or `None` when the
    /// conversion is not offered. The source column is never modified.
    pub fn try_reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        crate::reinterpret::try_reinterpret(self, target)
    }

    pub fn try_reinterpret_as<T: ColumnValue>(&self) -> Option<ColumnRef<T>> {
        T::from_any(self)
    }

    pub fn as_array(&self) -> Option<&ArrayColumn> {
        match self {
            AnyColumn::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleColumn> {
        match self {
            AnyColumn::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&VariantColumn> {
        match self {
            AnyColumn::Variant(variant) => Some(variant),
            _ => None,
        }
    }

    /// Materializes every row.
    pub fn values(&self) -> Result<Vec<Value>> {
        (0..self.row_count()).map(|i| self.value(i)).collect()
    }
}

impl fmt::Debug for AnyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyColumn")
            .field("kind", &self.kind())
            .field("row_count", &self.row_count())
            .finish()
    }
}

#[cold]
pub(crate) fn row_out_of_range(index: usize, row_count: usize) -> Error {
    Error::invalid_arg("index", format!("row {index} is out of range 0..{row_count}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Describe;

    impl ColumnDispatcher for Describe {
        type Output = (ValueKind, usize);

        fn dispatch<T: ScalarValue>(self, column: ColumnRef<T>) -> Self::Output {
            (T::KIND, column.row_count())
        }
    }

    #[test]
    fn test_dispatch_resolves_scalar_type() {
        let column = PrimitiveColumn::new(vec![1u64, 2, 3]).into_any();
        assert_eq!(column.try_dispatch(Describe), Some((ValueKind::UInt64, 3)));

        let nothing = NothingColumn::new(4).into_any();
        assert_eq!(nothing.try_dispatch(Describe), Some((ValueKind::Nothing, 4)));
    }

    #[test]
    fn test_dispatch_declines_composites() {
        let elements = PrimitiveColumn::new(vec![1i32, 2]).into_any();
        let array = ArrayColumn::new(elements, vec![ArrayRange::new(0, 2)]).unwrap();
        assert!(AnyColumn::Array(array).try_dispatch(Describe).is_none());
    }

    #[test]
    fn test_any_column_values() {
        let column = NullableColumn::from_options(vec![Some(1i8), None, Some(3)], 0).into_any();
        assert_eq!(column.kind(), ValueKind::Int8);
        assert_eq!(
            column.values().unwrap(),
            vec![Value::Int8(1), Value::Null, Value::Int8(3)]
        );
        assert!(column.is_null(1));
        assert_eq!(column.default_value(), Some(Value::Int8(0)));
    }
}
