use chwire_common::Result;

use crate::column::AnyColumn;
use crate::reader::{RowCursor, SequenceSize};

use super::ColumnWriter;

/// `Nullable(T)`: the null map of `column`, then the value writer's output.
pub struct NullableColumnWriter {
    column: AnyColumn,
    nulls: RowCursor,
    values: Box<dyn ColumnWriter>,
}

impl NullableColumnWriter {
    /// `values` writes the same rows as `column`, with placeholders for nulls.
    pub fn new(column: AnyColumn, values: Box<dyn ColumnWriter>) -> NullableColumnWriter {
        NullableColumnWriter {
            nulls: RowCursor::new(column.row_count()),
            column,
            values,
        }
    }
}

impl ColumnWriter for NullableColumnWriter {
    fn column_name(&self) -> &str {
        self.values.column_name()
    }

    fn row_count(&self) -> usize {
        self.nulls.row_count()
    }

    fn is_complete(&self) -> bool {
        self.nulls.is_complete() && self.values.is_complete()
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        let mut written = 0;
        if !self.nulls.is_complete() {
            written = self.nulls.remaining().min(dst.len());
            let start = self.nulls.position();
            for (i, out) in dst[..written].iter_mut().enumerate() {
                *out = u8::from(self.column.is_null(start + i));
            }
            self.nulls.advance(written);
            if !self.nulls.is_complete() {
                return Ok(SequenceSize::new(written, 0));
            }
        }
        let mut size = self.values.write_next(&mut dst[written..])?;
        size.bytes += written;
        Ok(size)
    }
}
