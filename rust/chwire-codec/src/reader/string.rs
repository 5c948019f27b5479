//! Readers for `String` (varint length + payload) and `FixedString(N)`.
//!
//! Both keep every chunk's consumed bytes as one segment of a [`SegmentedBytes`],
//! so the decoded column never needs a single buffer holding all values.

use std::sync::Arc;

use bytes::Bytes;
use chwire_common::{Result, error::Error};
use log::trace;

use crate::column::AnyColumn;
use crate::column::string::{BytesColumn, SegmentedBytes, StringColumn};

use super::{
    ColumnReader, RowCursor, SequenceSize, SkippingColumnReader, decode_varint, incomplete_read,
};

/// Scans `chunk` for whole length-prefixed values, at most `limit` of them.
/// Returns the `(offset, length)` payload ranges and the bytes they span.
fn scan_values(chunk: &[u8], limit: usize) -> Result<(Vec<(usize, usize)>, usize)> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while ranges.len() < limit {
        let Some((length, header)) = decode_varint(&chunk[pos..])? else {
            break;
        };
        let start = pos + header;
        let Some(end) = usize::try_from(length)
            .ok()
            .and_then(|length| start.checked_add(length))
        else {
            return Err(Error::protocol(format!(
                "string length {length} does not fit in memory"
            )));
        };
        if end > chunk.len() {
            break;
        }
        ranges.push((start, end - start));
        pos = end;
    }
    Ok((ranges, pos))
}

pub struct StringColumnReader {
    cursor: RowCursor,
    data: SegmentedBytes,
}

impl StringColumnReader {
    pub fn new(row_count: usize) -> StringColumnReader {
        StringColumnReader {
            cursor: RowCursor::new(row_count),
            data: SegmentedBytes::new(),
        }
    }
}

impl SkippingColumnReader for StringColumnReader {
    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.cursor.check_readable()?;
        let (ranges, consumed) = scan_values(chunk, self.cursor.remaining())?;
        if ranges.is_empty() {
            return Ok(SequenceSize::default());
        }
        let count = ranges.len();
        self.data
            .push_segment(Bytes::copy_from_slice(&chunk[..consumed]), ranges);
        self.cursor.advance(count);
        trace!("string reader: {count} values in {consumed} bytes");
        Ok(SequenceSize::new(consumed, count))
    }
}

impl ColumnReader for StringColumnReader {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        if !self.cursor.is_complete() {
            return Err(incomplete_read(self.cursor.position(), self.cursor.row_count()));
        }
        Ok(StringColumn::new(Arc::new(self.data)).into_any())
    }
}

pub struct StringSkipReader {
    cursor: RowCursor,
}

impl StringSkipReader {
    pub fn new(row_count: usize) -> StringSkipReader {
        StringSkipReader {
            cursor: RowCursor::new(row_count),
        }
    }
}

impl SkippingColumnReader for StringSkipReader {
    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.cursor.check_readable()?;
        let (ranges, consumed) = scan_values(chunk, self.cursor.remaining())?;
        self.cursor.advance(ranges.len());
        Ok(SequenceSize::new(consumed, ranges.len()))
    }
}

/// `FixedString(N)`: every value is exactly `size` bytes, zero padded.
pub struct FixedStringReader {
    cursor: RowCursor,
    size: usize,
    data: SegmentedBytes,
}

impl FixedStringReader {
    pub fn new(row_count: usize, size: usize) -> FixedStringReader {
        debug_assert!(size > 0);
        FixedStringReader {
            cursor: RowCursor::new(row_count),
            size,
            data: SegmentedBytes::new(),
        }
    }
}

impl SkippingColumnReader for FixedStringReader {
    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.cursor.check_readable()?;
        let count = self.cursor.remaining().min(chunk.len() / self.size);
        if count == 0 {
            return Ok(SequenceSize::default());
        }
        let bytes = count * self.size;
        let size = self.size;
        self.data.push_segment(
            Bytes::copy_from_slice(&chunk[..bytes]),
            (0..count).map(|i| (i * size, size)),
        );
        self.cursor.advance(count);
        Ok(SequenceSize::new(bytes, count))
    }
}

impl ColumnReader for FixedStringReader {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        if !self.cursor.is_complete() {
            return Err(incomplete_read(self.cursor.position(), self.cursor.row_count()));
        }
        Ok(BytesColumn::fixed(Arc::new(self.data), self.size).into_any())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ChunkedReadDriver;
    use crate::value::Value;
    use integer_encoding::VarInt;

    fn encode(values: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for value in values {
            out.extend_from_slice(&(value.len() as u64).encode_var_vec());
            out.extend_from_slice(value.as_bytes());
        }
        out
    }

    #[test]
    fn test_values_split_across_chunks() {
        let long = "x".repeat(300);
        let values = ["", "abc", long.as_str(), "ü"];
        let bytes = encode(&values);
        let reader: Box<dyn ColumnReader> = Box::new(StringColumnReader::new(values.len()));
        let mut driver = ChunkedReadDriver::new(reader);
        for chunk in bytes.chunks(7) {
            driver.push(chunk).unwrap();
        }
        assert!(driver.is_complete());
        let column = driver.finish().unwrap();
        let expected: Vec<Value> = values.iter().map(|v| Value::String(v.to_string())).collect();
        assert_eq!(column.values().unwrap(), expected);
    }

    #[test]
    fn test_partial_payload_is_not_consumed() {
        let bytes = encode(&["hello"]);
        let mut reader = StringColumnReader::new(1);
        assert_eq!(reader.read_next(&bytes[..4]).unwrap(), SequenceSize::default());
        assert_eq!(reader.read_next(&bytes).unwrap(), SequenceSize::new(6, 1));
    }

    #[test]
    fn test_malformed_length() {
        let bytes = [0xffu8; 12];
        let mut reader = StringSkipReader::new(1);
        assert!(reader.read_next(&bytes).unwrap_err().is_protocol());
        // Fewer bytes may still be a prefix of a valid varint.
        let mut reader = StringSkipReader::new(1);
        assert!(reader.read_next(&bytes[..9]).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_string() {
        let mut reader = Box::new(FixedStringReader::new(2, 3));
        assert_eq!(reader.read_next(b"ab\0cd").unwrap(), SequenceSize::new(3, 1));
        assert_eq!(reader.read_next(b"cde").unwrap(), SequenceSize::new(3, 1));
        let column = reader.end_read().unwrap();
        let text = column.try_reinterpret_as::<String>().unwrap();
        assert_eq!(text.value(0).unwrap(), "ab");
        assert_eq!(text.value(1).unwrap(), "cde");
    }
}
