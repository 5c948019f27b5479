use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::column::{AnyColumn, with_null_map};

use super::{
    ColumnReader, RowCursor, SequenceSize, SkippingColumnReader, incomplete_read, read_past_end,
};

/// `Nullable(T)`: one byte per row (nonzero meaning null), then the `T` column.
pub struct NullableColumnReader<R: ?Sized> {
    nulls: RowCursor,
    null_map: Vec<u8>,
    values: Box<R>,
}

impl<R: SkippingColumnReader + ?Sized> NullableColumnReader<R> {
    pub fn new(values: Box<R>) -> NullableColumnReader<R> {
        let row_count = values.row_count();
        NullableColumnReader {
            nulls: RowCursor::new(row_count),
            null_map: Vec::with_capacity(row_count.min(64 * 1024)),
            values,
        }
    }
}

impl<R: SkippingColumnReader + ?Sized> SkippingColumnReader for NullableColumnReader<R> {
    fn row_count(&self) -> usize {
        self.nulls.row_count()
    }

    fn is_complete(&self) -> bool {
        self.nulls.is_complete() && self.values.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count()));
        }
        let mut consumed = 0;
        if !self.nulls.is_complete() {
            consumed = self.nulls.remaining().min(chunk.len());
            self.null_map.extend_from_slice(&chunk[..consumed]);
            self.nulls.advance(consumed);
            if !self.nulls.is_complete() || self.values.is_complete() {
                return Ok(SequenceSize::new(consumed, 0));
            }
        }
        let mut size = self.values.read_next(&chunk[consumed..])?;
        size.bytes += consumed;
        Ok(size)
    }
}

impl ColumnReader for NullableColumnReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        if !self.is_complete() {
            return Err(incomplete_read(self.nulls.position(), self.nulls.row_count()));
        }
        let values = self.values.end_read()?;
        let null_map: Arc<[u8]> = self.null_map.into();
        with_null_map(&values, null_map).ok_or_else(|| {
            Error::not_supported(format!("a {} column cannot be nullable", values.kind()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;
    use crate::reader::fixed::FixedColumnReader;
    use crate::value::Value;

    fn reader(rows: usize) -> Box<NullableColumnReader<dyn ColumnReader>> {
        let values: Box<dyn ColumnReader> = Box::new(FixedColumnReader::<u16>::new(rows, |v| {
            Ok(PrimitiveColumn::zero_default(v).into_any())
        }));
        Box::new(NullableColumnReader::new(values))
    }

    #[test]
    fn test_nulls_then_values() {
        let mut bytes = vec![0u8, 1, 0];
        for v in [7u16, 0, 9] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut reader = reader(3);
        assert_eq!(reader.read_next(&bytes[..2]).unwrap(), SequenceSize::new(2, 0));
        assert_eq!(reader.read_next(&bytes[2..6]).unwrap(), SequenceSize::new(3, 1));
        assert_eq!(reader.read_next(&bytes[5..]).unwrap(), SequenceSize::new(4, 2));
        let column = reader.end_read().unwrap();
        assert_eq!(
            column.values().unwrap(),
            vec![Value::UInt16(7), Value::Null, Value::UInt16(9)]
        );
    }

    #[test]
    fn test_zero_rows() {
        let reader = reader(0);
        assert!(reader.is_complete());
        assert_eq!(reader.end_read().unwrap().row_count(), 0);
    }
}
