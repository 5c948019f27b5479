use chwire_common::{Result, error::Error};

use crate::column::ArrayColumn;
use crate::reader::{RowCursor, SequenceSize};

use super::ColumnWriter;

/// `Array(T)`: cumulative `u64` end offsets, then the element writer's output.
///
/// The array's ranges must tile its element column from the start, which holds
/// for every array produced by a reader.
pub struct ArrayColumnWriter {
    ends: Vec<u64>,
    offsets: RowCursor,
    elements: Box<dyn ColumnWriter>,
    elements_written: u64,
    rows_reported: usize,
}

impl ArrayColumnWriter {
    pub fn new(array: &ArrayColumn, elements: Box<dyn ColumnWriter>) -> Result<ArrayColumnWriter> {
        let mut ends = Vec::with_capacity(array.row_count());
        let mut end = 0usize;
        for (row, range) in array.ranges().iter().enumerate() {
            if range.offset != end {
                return Err(Error::invalid_arg(
                    "array",
                    format!(
                        "row {row} starts at element {}, expected {end}",
                        range.offset
                    ),
                ));
            }
            end = range.end();
            ends.push(end as u64);
        }
        if end != elements.row_count() {
            return Err(Error::invalid_arg(
                "array",
                format!(
                    "ranges cover {end} elements of {}",
                    elements.row_count()
                ),
            ));
        }
        Ok(ArrayColumnWriter {
            offsets: RowCursor::new(ends.len()),
            ends,
            elements,
            elements_written: 0,
            rows_reported: 0,
        })
    }

    fn take_finished_rows(&mut self) -> usize {
        let start = self.rows_reported;
        while self.rows_reported < self.ends.len()
            && self.ends[self.rows_reported] <= self.elements_written
        {
            self.rows_reported += 1;
        }
        self.rows_reported - start
    }
}

impl ColumnWriter for ArrayColumnWriter {
    fn column_name(&self) -> &str {
        self.elements.column_name()
    }

    fn row_count(&self) -> usize {
        self.offsets.row_count()
    }

    fn is_complete(&self) -> bool {
        self.rows_reported == self.ends.len() && self.elements.is_complete()
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        let mut written = 0;
        if !self.offsets.is_complete() {
            let count = self.offsets.remaining().min(dst.len() / 8);
            let start = self.offsets.position();
            for (end, out) in self.ends[start..start + count]
                .iter()
                .zip(dst.chunks_exact_mut(8))
            {
                out.copy_from_slice(&end.to_le_bytes());
            }
            self.offsets.advance(count);
            written = count * 8;
            if !self.offsets.is_complete() {
                return Ok(SequenceSize::new(written, 0));
            }
        }
        if !self.elements.is_complete() {
            let size = self.elements.write_next(&mut dst[written..])?;
            written += size.bytes;
            self.elements_written += size.elements as u64;
        }
        let rows = self.take_finished_rows();
        Ok(SequenceSize::new(written, rows))
    }
}
