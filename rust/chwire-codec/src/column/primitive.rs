use std::sync::Arc;

use chwire_common::Result;

use crate::value::{ColumnValue, ScalarValue};

use super::{AnyColumn, Column, row_out_of_range};

/// A contiguous run of decoded fixed-size values.
///
/// The buffer is shared through `Arc`, so views derived from the column keep it
/// alive without copying.
pub struct PrimitiveColumn<T> {
    values: Arc<[T]>,
    default: Option<T>,
}

impl<T: ColumnValue> PrimitiveColumn<T> {
    pub fn new(values: impl Into<Arc<[T]>>) -> PrimitiveColumn<T> {
        PrimitiveColumn {
            values: values.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn shared_values(&self) -> Arc<[T]> {
        self.values.clone()
    }

    pub fn into_any(self) -> AnyColumn
    where
        T: ScalarValue,
    {
        T::wrap(Arc::new(self))
    }
}

impl<T: ColumnValue + Default> PrimitiveColumn<T> {
    /// Creates a column whose default value is `T::default()`.
    pub fn zero_default(values: impl Into<Arc<[T]>>) -> PrimitiveColumn<T> {
        PrimitiveColumn::new(values).with_default(T::default())
    }
}

impl<T: ColumnValue> Column<T> for PrimitiveColumn<T> {
    fn row_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn value(&self, index: usize) -> Result<T> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| row_out_of_range(index, self.values.len()))
    }

    fn default_value(&self) -> Option<T> {
        self.default.clone()
    }

    fn as_slice(&self) -> Option<&[T]> {
        Some(&self.values[..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chwire_common::error::ErrorKind;

    #[test]
    fn test_primitive_access() {
        let column = PrimitiveColumn::zero_default(vec![3i64, -4, 5]);
        assert_eq!(column.row_count(), 3);
        assert_eq!(column.value(1).unwrap(), -4);
        assert!(!column.is_null(1));
        assert_eq!(column.default_value(), Some(0));
        assert_eq!(column.as_slice(), Some(&[3i64, -4, 5][..]));
    }

    #[test]
    fn test_primitive_out_of_range() {
        let column = PrimitiveColumn::new(vec![1u8]);
        let err = column.value(1).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert_eq!(column.default_value(), None);
    }
}
