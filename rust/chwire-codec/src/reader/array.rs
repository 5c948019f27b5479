use std::sync::Arc;

use chwire_common::{Result, error::Error};
use log::trace;

use crate::column::{AnyColumn, ArrayColumn};
use crate::types::ColumnType;

use super::fixed::decode_into;
use super::{
    ChildReader, ColumnReader, RowCursor, SequenceSize, SkippingColumnReader, incomplete_read,
    read_past_end,
};

/// `Array(T)`: one little-endian `u64` cumulative end offset per row, then the
/// flattened `T` column holding all elements.
///
/// A row is reported as read once all of its elements are.
pub struct ArrayColumnReader<R: ?Sized> {
    element_type: Arc<dyn ColumnType>,
    offsets: RowCursor,
    ends: Vec<u64>,
    elements: Option<Box<R>>,
    elements_read: usize,
    rows_reported: usize,
}

impl<R: ChildReader + ?Sized> ArrayColumnReader<R> {
    pub fn new(element_type: Arc<dyn ColumnType>, row_count: usize) -> Result<ArrayColumnReader<R>> {
        let mut reader = ArrayColumnReader {
            element_type,
            offsets: RowCursor::new(row_count),
            ends: Vec::with_capacity(row_count.min(64 * 1024)),
            elements: None,
            elements_read: 0,
            rows_reported: 0,
        };
        if row_count == 0 {
            reader.start_elements()?;
        }
        Ok(reader)
    }

    fn start_elements(&mut self) -> Result<()> {
        let total = self.ends.last().copied().unwrap_or(0);
        let total = usize::try_from(total).map_err(|_| {
            Error::protocol(format!("array element count {total} does not fit in memory"))
        })?;
        trace!("array reader: offsets complete, {total} elements");
        self.elements = Some(R::create(&*self.element_type, total)?);
        Ok(())
    }

    /// Counts the rows whose elements have all been read since the last call.
    fn take_finished_rows(&mut self) -> usize {
        let start = self.rows_reported;
        while self.rows_reported < self.ends.len()
            && self.ends[self.rows_reported] <= self.elements_read as u64
        {
            self.rows_reported += 1;
        }
        self.rows_reported - start
    }

    fn read_offsets(&mut self, chunk: &[u8]) -> Result<usize> {
        let count = self.offsets.remaining().min(chunk.len() / 8);
        let start = self.ends.len();
        decode_into::<u64>(&chunk[..count * 8], &mut self.ends);
        let mut previous = if start == 0 { 0 } else { self.ends[start - 1] };
        for &end in &self.ends[start..] {
            if end < previous {
                return Err(Error::protocol(format!(
                    "array end offsets must not decrease: {end} follows {previous}"
                )));
            }
            previous = end;
        }
        self.offsets.advance(count);
        Ok(count * 8)
    }
}

impl<R: ChildReader + ?Sized> SkippingColumnReader for ArrayColumnReader<R> {
    fn row_count(&self) -> usize {
        self.offsets.row_count()
    }

    fn is_complete(&self) -> bool {
        self.rows_reported == self.offsets.row_count()
            && self.elements.as_ref().is_some_and(|e| e.is_complete())
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count()));
        }
        let mut consumed = 0;
        if !self.offsets.is_complete() {
            consumed = self.read_offsets(chunk)?;
            if !self.offsets.is_complete() {
                return Ok(SequenceSize::new(consumed, 0));
            }
            self.start_elements()?;
        }
        let Some(elements) = self.elements.as_mut() else {
            return Ok(SequenceSize::new(consumed, 0));
        };
        if !elements.is_complete() {
            let size = elements.read_next(&chunk[consumed..])?;
            consumed += size.bytes;
            self.elements_read += size.elements;
        }
        let rows = self.take_finished_rows();
        Ok(SequenceSize::new(consumed, rows))
    }
}

impl ColumnReader for ArrayColumnReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        if !self.is_complete() {
            return Err(incomplete_read(self.rows_reported, self.offsets.row_count()));
        }
        let Some(elements) = self.elements else {
            return Err(incomplete_read(0, self.offsets.row_count()));
        };
        let elements = elements.end_read()?;
        Ok(AnyColumn::Array(ArrayColumn::from_end_offsets(
            elements, &self.ends,
        )?))
    }
}
