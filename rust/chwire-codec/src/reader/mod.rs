//! Incremental column decoders.
//!
//! A reader is created for a known row count and fed byte chunks of arbitrary
//! size through [`SkippingColumnReader::read_next`]. Each call consumes only whole
//! elements and reports how many bytes it consumed and how many rows it finished;
//! a call that cannot make progress consumes nothing, and the caller retries with
//! more bytes appended (see [`ChunkedReadDriver`]). Once every row is decoded,
//! [`ColumnReader::end_read`] turns the reader into an immutable column.

use std::ops::AddAssign;
use std::sync::Arc;

use chwire_common::{Result, error::Error};
use integer_encoding::VarInt;

use crate::column::AnyColumn;
use crate::types::{ColumnType, SerializationMode};

pub mod array;
pub mod driver;
pub mod fixed;
pub mod nullable;
pub mod sparse;
pub mod string;
pub mod tuple;
pub mod variant;

pub use driver::ChunkedReadDriver;

/// Progress reported by a single read or write step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceSize {
    pub bytes: usize,
    pub elements: usize,
}

impl SequenceSize {
    pub fn new(bytes: usize, elements: usize) -> SequenceSize {
        SequenceSize { bytes, elements }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0 && self.elements == 0
    }
}

impl AddAssign for SequenceSize {
    fn add_assign(&mut self, rhs: SequenceSize) {
        self.bytes += rhs.bytes;
        self.elements += rhs.elements;
    }
}

/// The chunk-consumption contract shared by all readers. Readers that only
/// implement this trait advance past a column's bytes without keeping its values.
pub trait SkippingColumnReader: Send {
    fn row_count(&self) -> usize;

    fn is_complete(&self) -> bool;

    /// Decodes as many whole elements from `chunk` as the remaining row quota
    /// allows. Calling this on a complete reader is a protocol error.
    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize>;
}

pub trait ColumnReader: SkippingColumnReader {
    /// Finalizes the decoded rows into a column. Fails with an invalid-operation
    /// error unless the reader is complete.
    fn end_read(self: Box<Self>) -> Result<AnyColumn>;
}

/// Creates a reader honoring the serialization `mode`.
pub fn create_reader(
    ty: Arc<dyn ColumnType>,
    row_count: usize,
    mode: SerializationMode,
) -> Result<Box<dyn ColumnReader>> {
    <dyn ColumnReader as ChildReader>::create_with_mode(ty, row_count, mode)
}

pub fn create_skipping_reader(
    ty: Arc<dyn ColumnType>,
    row_count: usize,
    mode: SerializationMode,
) -> Result<Box<dyn SkippingColumnReader>> {
    <dyn SkippingColumnReader as ChildReader>::create_with_mode(ty, row_count, mode)
}

/// Lets composite readers be written once for both the materializing
/// (`dyn ColumnReader`) and the skipping (`dyn SkippingColumnReader`) flavor.
pub trait ChildReader: SkippingColumnReader {
    fn create(ty: &dyn ColumnType, row_count: usize) -> Result<Box<Self>>;

    fn create_with_mode(
        ty: Arc<dyn ColumnType>,
        row_count: usize,
        mode: SerializationMode,
    ) -> Result<Box<Self>>;
}

impl ChildReader for dyn ColumnReader {
    fn create(ty: &dyn ColumnType, row_count: usize) -> Result<Box<Self>> {
        ty.create_plain_reader(row_count)
    }

    fn create_with_mode(
        ty: Arc<dyn ColumnType>,
        row_count: usize,
        mode: SerializationMode,
    ) -> Result<Box<Self>> {
        match mode {
            SerializationMode::Default => ty.create_plain_reader(row_count),
            SerializationMode::Sparse => {
                let reader: Box<Self> =
                    Box::new(sparse::SparseColumnReader::<Self>::new(&*ty, row_count)?);
                Ok(reader)
            }
            SerializationMode::Custom => {
                let reader: Box<Self> =
                    Box::new(sparse::CustomModeReader::<Self>::new(ty, row_count)?);
                Ok(reader)
            }
        }
    }
}

impl ChildReader for dyn SkippingColumnReader {
    fn create(ty: &dyn ColumnType, row_count: usize) -> Result<Box<Self>> {
        ty.create_plain_skipping_reader(row_count)
    }

    fn create_with_mode(
        ty: Arc<dyn ColumnType>,
        row_count: usize,
        mode: SerializationMode,
    ) -> Result<Box<Self>> {
        match mode {
            SerializationMode::Default => ty.create_plain_skipping_reader(row_count),
            SerializationMode::Sparse => {
                let reader: Box<Self> =
                    Box::new(sparse::SparseColumnReader::<Self>::new(&*ty, row_count)?);
                Ok(reader)
            }
            SerializationMode::Custom => {
                let reader: Box<Self> =
                    Box::new(sparse::CustomModeReader::<Self>::new(ty, row_count)?);
                Ok(reader)
            }
        }
    }
}

/// Row progress of a reader or writer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowCursor {
    row_count: usize,
    position: usize,
}

impl RowCursor {
    pub fn new(row_count: usize) -> RowCursor {
        RowCursor {
            row_count,
            position: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.row_count - self.position
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.row_count
    }

    pub fn advance(&mut self, count: usize) {
        debug_assert!(count <= self.remaining());
        self.position += count;
    }

    /// Fails when the row quota is already reached.
    pub fn check_readable(&self) -> Result<()> {
        if self.is_complete() {
            Err(read_past_end(self.row_count))
        } else {
            Ok(())
        }
    }
}

#[cold]
pub(crate) fn read_past_end(row_count: usize) -> Error {
    Error::protocol(format!("read past the end of a {row_count}-row column"))
}

#[cold]
pub(crate) fn incomplete_read(decoded: usize, row_count: usize) -> Error {
    Error::invalid_operation(format!(
        "end_read after {decoded} of {row_count} rows were decoded"
    ))
}

/// The longest LEB128 encoding of a `u64`.
pub(crate) const MAX_VARINT_LEN: usize = 10;

/// Decodes a LEB128 varint from the start of `src`. Returns `None` when `src` ends
/// inside the varint.
pub(crate) fn decode_varint(src: &[u8]) -> Result<Option<(u64, usize)>> {
    match u64::decode_var(src) {
        // The tenth byte carries only the top bit of a u64.
        Some((_, len)) if len == MAX_VARINT_LEN && src[len - 1] > 1 => Err(Error::protocol(
            "malformed varint: value does not fit in 64 bits",
        )),
        Some(decoded) => Ok(Some(decoded)),
        None if src.len() >= MAX_VARINT_LEN => {
            Err(Error::protocol("malformed varint: no terminating byte within 10 bytes"))
        }
        None => Ok(None),
    }
}

/// Feeds `bytes` in one piece and finalizes the reader. The input must hold the
/// whole column.
pub fn read_column(reader: Box<dyn ColumnReader>, bytes: &[u8]) -> Result<AnyColumn> {
    let mut driver = ChunkedReadDriver::new(reader);
    driver.push(bytes)?;
    driver.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_varint_bounds() {
        assert_eq!(decode_varint(&[0x96, 0x01]).unwrap(), Some((150, 2)));
        assert_eq!(decode_varint(&[0x96]).unwrap(), None);

        let mut max = vec![0xFF; 9];
        max.push(0x01);
        assert_eq!(decode_varint(&max).unwrap(), Some((u64::MAX, 10)));

        let mut wide = vec![0xFF; 9];
        wide.push(0x02);
        assert!(decode_varint(&wide).unwrap_err().is_protocol());
        wide[9] = 0x7F;
        assert!(decode_varint(&wide).unwrap_err().is_protocol());
    }
}
