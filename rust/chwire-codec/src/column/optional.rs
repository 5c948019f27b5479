use chwire_common::Result;

use crate::value::ColumnValue;

use super::{Column, ColumnRef};

/// Views any column of `T` as a column of `Option<T>`, mapping null rows to `None`.
pub struct OptionalColumn<T> {
    inner: ColumnRef<T>,
}

impl<T: ColumnValue> OptionalColumn<T> {
    pub fn new(inner: ColumnRef<T>) -> OptionalColumn<T> {
        OptionalColumn { inner }
    }
}

impl<T: ColumnValue> Column<Option<T>> for OptionalColumn<T> {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, index: usize) -> Result<Option<T>> {
        if self.inner.is_null(index) {
            Ok(None)
        } else {
            self.inner.value(index).map(Some)
        }
    }

    fn is_null(&self, index: usize) -> bool {
        self.inner.is_null(index)
    }

    fn default_value(&self) -> Option<Option<T>> {
        Some(None)
    }
}
