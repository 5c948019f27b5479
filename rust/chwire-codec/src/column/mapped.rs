use std::marker::PhantomData;
use std::sync::Arc;

use chwire_common::Result;

use crate::value::ColumnValue;

use super::{Column, ColumnRef};

/// A source column viewed through a pure per-value transform.
///
/// Null tracking is taken from the source unchanged.
pub struct MappedColumn<S, T, F> {
    source: ColumnRef<S>,
    transform: F,
    _target: PhantomData<fn() -> T>,
}

impl<S, T, F> MappedColumn<S, T, F>
where
    S: ColumnValue,
    T: ColumnValue,
    F: Fn(S) -> Result<T> + Send + Sync + 'static,
{
    pub fn new(source: ColumnRef<S>, transform: F) -> MappedColumn<S, T, F> {
        MappedColumn {
            source,
            transform,
            _target: PhantomData,
        }
    }
}

impl<S, T, F> Column<T> for MappedColumn<S, T, F>
where
    S: ColumnValue,
    T: ColumnValue,
    F: Fn(S) -> Result<T> + Send + Sync + 'static,
{
    fn row_count(&self) -> usize {
        self.source.row_count()
    }

    #[inline]
    fn value(&self, index: usize) -> Result<T> {
        (self.transform)(self.source.value(index)?)
    }

    fn is_null(&self, index: usize) -> bool {
        self.source.is_null(index)
    }

    fn default_value(&self) -> Option<T> {
        self.source
            .default_value()
            .and_then(|value| (self.transform)(value).ok())
    }
}

pub fn map_column<S, T, F>(source: ColumnRef<S>, transform: F) -> ColumnRef<T>
where
    S: ColumnValue,
    T: ColumnValue,
    F: Fn(S) -> Result<T> + Send + Sync + 'static,
{
    Arc::new(MappedColumn::new(source, transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::NullableColumn;

    #[test]
    fn test_mapped_column_proxies_nulls() {
        let source: ColumnRef<i16> =
            Arc::new(NullableColumn::from_options(vec![Some(2i16), None], 0));
        let mapped = map_column(source, |v: i16| Ok(i32::from(v) * 10));
        assert_eq!(mapped.row_count(), 2);
        assert_eq!(mapped.value(0).unwrap(), 20);
        assert!(!mapped.is_null(0));
        assert!(mapped.is_null(1));
        assert_eq!(mapped.default_value(), Some(0));
    }
}
