use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::value::{ScalarValue, ValueKind};

use super::{AnyColumn, Column, ColumnDispatcher, ColumnRef, PrimitiveColumn};

/// A value column layered with an optional null map (one byte per row, nonzero
/// meaning null).
///
/// Without a null map no row is null. [`Column::value`] returns the underlying
/// value whether or not the row is null.
pub struct NullableColumn<T> {
    values: ColumnRef<T>,
    null_map: Option<Arc<[u8]>>,
}

impl<T: ScalarValue> NullableColumn<T> {
    pub fn new(values: ColumnRef<T>, null_map: Option<Arc<[u8]>>) -> Result<NullableColumn<T>> {
        if let Some(null_map) = &null_map {
            if null_map.len() != values.row_count() {
                return Err(Error::invalid_arg(
                    "null_map",
                    format!(
                        "null map has {} rows, value column has {}",
                        null_map.len(),
                        values.row_count()
                    ),
                ));
            }
        }
        Ok(NullableColumn { values, null_map })
    }

    /// Builds a nullable column from optional values; `filler` takes the place of
    /// null rows in the value column and is the column's default.
    pub fn from_options(rows: Vec<Option<T>>, filler: T) -> NullableColumn<T> {
        let null_map: Arc<[u8]> = rows.iter().map(|v| u8::from(v.is_none())).collect();
        let values: Vec<T> = rows
            .into_iter()
            .map(|v| v.unwrap_or_else(|| filler.clone()))
            .collect();
        NullableColumn {
            values: Arc::new(PrimitiveColumn::new(values).with_default(filler)),
            null_map: Some(null_map),
        }
    }

    pub fn values(&self) -> &ColumnRef<T> {
        &self.values
    }

    pub fn null_map(&self) -> Option<&[u8]> {
        self.null_map.as_deref()
    }

    pub fn into_any(self) -> AnyColumn {
        T::wrap(Arc::new(self))
    }
}

impl<T: ScalarValue> Column<T> for NullableColumn<T> {
    fn row_count(&self) -> usize {
        self.values.row_count()
    }

    #[inline]
    fn value(&self, index: usize) -> Result<T> {
        self.values.value(index)
    }

    #[inline]
    fn is_null(&self, index: usize) -> bool {
        self.null_map
            .as_ref()
            .is_some_and(|map| map.get(index).is_some_and(|&b| b != 0))
    }

    fn default_value(&self) -> Option<T> {
        self.values.default_value()
    }

    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        let inner = T::wrap(self.values.clone()).try_reinterpret(target)?;
        match &self.null_map {
            Some(null_map) => with_null_map(&inner, null_map.clone()),
            None => Some(inner),
        }
    }
}

struct WrapNullMap(Arc<[u8]>);

impl ColumnDispatcher for WrapNullMap {
    type Output = Option<AnyColumn>;

    fn dispatch<T: ScalarValue>(self, column: ColumnRef<T>) -> Option<AnyColumn> {
        let nullable = NullableColumn::new(column, Some(self.0)).ok()?;
        Some(nullable.into_any())
    }
}

/// Layers `null_map` over a scalar column. Returns `None` for composite columns or
/// when the lengths disagree.
pub fn with_null_map(column: &AnyColumn, null_map: Arc<[u8]>) -> Option<AnyColumn> {
    column.try_dispatch(WrapNullMap(null_map)).flatten()
}
