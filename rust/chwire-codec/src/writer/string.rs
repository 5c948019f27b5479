use bytes::Bytes;
use chwire_common::{Result, error::Error};
use integer_encoding::VarInt;

use crate::column::ColumnRef;
use crate::reader::{RowCursor, SequenceSize};

use super::ColumnWriter;

/// `String`: varint length, then the bytes. Null rows are written empty.
pub struct StringColumnWriter {
    name: String,
    source: ColumnRef<Bytes>,
    cursor: RowCursor,
}

impl StringColumnWriter {
    pub fn new(name: &str, source: ColumnRef<Bytes>) -> StringColumnWriter {
        StringColumnWriter {
            name: name.to_string(),
            cursor: RowCursor::new(source.row_count()),
            source,
        }
    }
}

impl ColumnWriter for StringColumnWriter {
    fn column_name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        let mut pos = 0;
        let mut count = 0;
        while !self.cursor.is_complete() {
            let row = self.cursor.position();
            let value = if self.source.is_null(row) {
                Bytes::new()
            } else {
                self.source.value(row)?
            };
            let length = value.len() as u64;
            let end = pos + length.required_space() + value.len();
            if end > dst.len() {
                break;
            }
            pos += length.encode_var(&mut dst[pos..]);
            dst[pos..end].copy_from_slice(&value);
            pos = end;
            count += 1;
            self.cursor.advance(1);
        }
        Ok(SequenceSize::new(pos, count))
    }
}

/// `FixedString(N)`: every value zero padded to `size` bytes. Longer values fail
/// with an overflow error.
pub struct FixedStringWriter {
    name: String,
    source: ColumnRef<Bytes>,
    cursor: RowCursor,
    size: usize,
}

impl FixedStringWriter {
    pub fn new(name: &str, source: ColumnRef<Bytes>, size: usize) -> FixedStringWriter {
        FixedStringWriter {
            name: name.to_string(),
            cursor: RowCursor::new(source.row_count()),
            source,
            size,
        }
    }
}

impl ColumnWriter for FixedStringWriter {
    fn column_name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        let count = self.cursor.remaining().min(dst.len() / self.size);
        let start = self.cursor.position();
        for (i, out) in dst.chunks_exact_mut(self.size).take(count).enumerate() {
            let row = start + i;
            out.fill(0);
            if self.source.is_null(row) {
                continue;
            }
            let value = self.source.value(row)?;
            if value.len() > self.size {
                return Err(Error::overflow(format!(
                    "column '{}': a {}-byte value does not fit FixedString({})",
                    self.name,
                    value.len(),
                    self.size
                )));
            }
            out[..value.len()].copy_from_slice(&value);
        }
        self.cursor.advance(count);
        Ok(SequenceSize::new(count * self.size, count))
    }
}
