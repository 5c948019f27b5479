use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chwire_common::{Result, error::Error};

use crate::value::{ScalarValue, ValueKind};

use super::{AnyColumn, Column, ColumnDispatcher, ColumnRef, row_out_of_range};

/// A mostly-default column: explicit values at strictly ascending row offsets,
/// every other row holding the default value.
///
/// Lookups binary-search the offsets. The position of the previous lookup is
/// remembered, so forward scans resolve in constant time.
pub struct SparseColumn<T> {
    values: ColumnRef<T>,
    offsets: Arc<[usize]>,
    row_count: usize,
    trailing_defaults: bool,
    default: T,
    defaults_are_null: bool,
    cursor: AtomicUsize,
}

impl<T: ScalarValue> SparseColumn<T> {
    /// `values` holds one row per entry of `offsets`. Without `trailing_defaults`
    /// the last offset must be the last row.
    pub fn new(
        values: ColumnRef<T>,
        offsets: impl Into<Arc<[usize]>>,
        row_count: usize,
        trailing_defaults: bool,
        default: T,
    ) -> Result<SparseColumn<T>> {
        let offsets = offsets.into();
        if offsets.len() != values.row_count() {
            return Err(Error::invalid_arg(
                "offsets",
                format!(
                    "{} offsets for {} explicit values",
                    offsets.len(),
                    values.row_count()
                ),
            ));
        }
        if offsets.len() > row_count {
            return Err(Error::invalid_arg(
                "offsets",
                format!("{} offsets exceed {row_count} rows", offsets.len()),
            ));
        }
        if !offsets.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::invalid_arg(
                "offsets",
                "offsets must be strictly increasing",
            ));
        }
        if let Some(&last) = offsets.last() {
            if last >= row_count {
                return Err(Error::invalid_arg(
                    "offsets",
                    format!("offset {last} is out of range 0..{row_count}"),
                ));
            }
        }
        if !trailing_defaults && row_count > 0 && offsets.last() != Some(&(row_count - 1)) {
            return Err(Error::invalid_arg(
                "offsets",
                "the last offset must cover the last row when trailing defaults are excluded",
            ));
        }
        Ok(SparseColumn {
            values,
            offsets,
            row_count,
            trailing_defaults,
            default,
            defaults_are_null: false,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Marks the default rows as null, for sparse `Nullable` columns.
    pub fn with_null_defaults(mut self, defaults_are_null: bool) -> Self {
        self.defaults_are_null = defaults_are_null;
        self
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn trailing_defaults(&self) -> bool {
        self.trailing_defaults
    }

    pub fn into_any(self) -> AnyColumn {
        T::wrap(Arc::new(self))
    }

    fn layout(&self) -> SparseLayout {
        SparseLayout {
            offsets: self.offsets.clone(),
            row_count: self.row_count,
            trailing_defaults: self.trailing_defaults,
            defaults_are_null: self.defaults_are_null,
        }
    }

    /// Index into `values` of the explicit value at `row`, if any.
    fn lookup(&self, row: usize) -> Option<usize> {
        let offsets = &self.offsets[..];
        let is_partition = |k: usize| {
            k <= offsets.len()
                && (k == 0 || offsets[k - 1] < row)
                && (k == offsets.len() || offsets[k] >= row)
        };
        let hint = self.cursor.load(Ordering::Relaxed);
        let point = if is_partition(hint) {
            hint
        } else if is_partition(hint + 1) {
            hint + 1
        } else {
            offsets.partition_point(|&offset| offset < row)
        };
        self.cursor.store(point, Ordering::Relaxed);
        (point < offsets.len() && offsets[point] == row).then_some(point)
    }
}

impl<T: ScalarValue> Column<T> for SparseColumn<T> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn value(&self, index: usize) -> Result<T> {
        if index >= self.row_count {
            return Err(row_out_of_range(index, self.row_count));
        }
        match self.lookup(index) {
            Some(position) => self.values.value(position),
            None => Ok(self.default.clone()),
        }
    }

    fn is_null(&self, index: usize) -> bool {
        if index >= self.row_count {
            return false;
        }
        match self.lookup(index) {
            Some(position) => self.values.is_null(position),
            None => self.defaults_are_null,
        }
    }

    fn default_value(&self) -> Option<T> {
        Some(self.default.clone())
    }

    /// Reinterprets the explicit values and keeps the row layout. The default
    /// row becomes the reinterpreted values' default.
    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        let values = T::wrap(self.values.clone()).try_reinterpret(target)?;
        values.try_dispatch(self.layout())?.ok()
    }
}

/// The row layout of a sparse column, applied to a values column of any scalar
/// type. The default value is taken from the values column.
pub(crate) struct SparseLayout {
    pub offsets: Arc<[usize]>,
    pub row_count: usize,
    pub trailing_defaults: bool,
    pub defaults_are_null: bool,
}

impl ColumnDispatcher for SparseLayout {
    type Output = Result<AnyColumn>;

    fn dispatch<T: ScalarValue>(self, values: ColumnRef<T>) -> Result<AnyColumn> {
        let default = values.default_value().ok_or_else(|| {
            Error::not_supported(format!("{} columns have no default value", T::KIND))
        })?;
        let column = SparseColumn::new(
            values,
            self.offsets,
            self.row_count,
            self.trailing_defaults,
            default,
        )?
        .with_null_defaults(self.defaults_are_null);
        Ok(column.into_any())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;

    fn sample() -> SparseColumn<i32> {
        let values: ColumnRef<i32> = Arc::new(PrimitiveColumn::new(vec![10, 20, 30]));
        SparseColumn::new(values, vec![2, 5, 9], 12, true, 0).unwrap()
    }

    #[test]
    fn test_sparse_lookup() {
        let column = sample();
        assert_eq!(column.value(2).unwrap(), 10);
        assert_eq!(column.value(5).unwrap(), 20);
        assert_eq!(column.value(9).unwrap(), 30);
        assert_eq!(column.value(0).unwrap(), 0);
        assert_eq!(column.value(11).unwrap(), 0);
        assert!(column.value(12).is_err());
    }

    #[test]
    fn test_sparse_scan_orders_agree() {
        let column = sample();
        let forward: Vec<i32> = (0..12).map(|i| column.value(i).unwrap()).collect();
        let backward: Vec<i32> = (0..12).rev().map(|i| column.value(i).unwrap()).collect();
        let mut random = Vec::new();
        for _ in 0..100 {
            let i = fastrand::usize(0..12);
            random.push((i, column.value(i).unwrap()));
        }
        assert_eq!(forward, vec![0, 0, 10, 0, 0, 20, 0, 0, 0, 30, 0, 0]);
        assert_eq!(backward.into_iter().rev().collect::<Vec<_>>(), forward);
        assert!(random.into_iter().all(|(i, v)| forward[i] == v));
    }

    #[test]
    fn test_sparse_validation() {
        let values: ColumnRef<i32> = Arc::new(PrimitiveColumn::new(vec![1, 2]));
        assert!(SparseColumn::new(values.clone(), vec![3, 3], 5, true, 0).is_err());
        assert!(SparseColumn::new(values.clone(), vec![1, 5], 5, true, 0).is_err());
        assert!(SparseColumn::new(values.clone(), vec![1], 5, true, 0).is_err());
        assert!(SparseColumn::new(values.clone(), vec![1, 3], 5, false, 0).is_err());
        assert!(SparseColumn::new(values, vec![1, 4], 5, false, 0).is_ok());
    }

    #[test]
    fn test_reinterpret_keeps_layout() {
        let column = sample().into_any();
        let wide = column.try_reinterpret_as::<i64>().unwrap();
        assert_eq!(wide.value(9).unwrap(), 30);
        assert_eq!(wide.value(10).unwrap(), 0);
        assert_eq!(wide.default_value(), Some(0));
        assert!(column.try_reinterpret_as::<uuid::Uuid>().is_none());
    }

    #[test]
    fn test_sparse_null_defaults() {
        let values: ColumnRef<i32> = Arc::new(PrimitiveColumn::new(vec![7]));
        let column = SparseColumn::new(values, vec![1], 3, true, 0)
            .unwrap()
            .with_null_defaults(true);
        assert!(column.is_null(0));
        assert!(!column.is_null(1));
        assert!(column.is_null(2));
    }
}
