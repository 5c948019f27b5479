use std::sync::Arc;

use chwire_common::Result;

use super::{AnyColumn, Column, row_out_of_range};

/// The column of the `Nothing` type: every row is null.
pub struct NothingColumn {
    row_count: usize,
}

impl NothingColumn {
    pub fn new(row_count: usize) -> NothingColumn {
        NothingColumn { row_count }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::Nothing(Arc::new(self))
    }
}

impl Column<()> for NothingColumn {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn value(&self, index: usize) -> Result<()> {
        if index < self.row_count {
            Ok(())
        } else {
            Err(row_out_of_range(index, self.row_count))
        }
    }

    fn is_null(&self, _index: usize) -> bool {
        true
    }

    fn default_value(&self) -> Option<()> {
        Some(())
    }
}
