//! Readers for fixed-width wire elements.

use std::mem::size_of;

use bytemuck::Pod;
use chwire_common::Result;
use log::trace;

use crate::column::AnyColumn;

use super::{ColumnReader, RowCursor, SequenceSize, SkippingColumnReader, incomplete_read};

/// A fixed-width little-endian wire element.
///
/// On little-endian hosts the wire layout equals the memory layout and whole runs
/// are copied at once; [`WireElement::decode_le`] is the per-element fallback.
pub trait WireElement: Pod + Send + Sync + 'static {
    const SIZE: usize = size_of::<Self>();

    fn decode_le(src: &[u8]) -> Self;

    fn encode_le(&self, dst: &mut [u8]);
}

macro_rules! impl_wire_number {
    ($($t:ty),*) => {
        $(
            impl WireElement for $t {
                #[inline]
                fn decode_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$t>()];
                    raw.copy_from_slice(&src[..size_of::<$t>()]);
                    <$t>::from_le_bytes(raw)
                }

                #[inline]
                fn encode_le(&self, dst: &mut [u8]) {
                    dst[..size_of::<$t>()].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_wire_number!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

/// UUID: the high and the low half, each a little-endian `u64`.
impl WireElement for [u64; 2] {
    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        [u64::decode_le(&src[..8]), u64::decode_le(&src[8..16])]
    }

    #[inline]
    fn encode_le(&self, dst: &mut [u8]) {
        self[0].encode_le(&mut dst[..8]);
        self[1].encode_le(&mut dst[8..16]);
    }
}

/// IPv6: sixteen bytes in network order.
impl WireElement for [u8; 16] {
    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&src[..16]);
        raw
    }

    #[inline]
    fn encode_le(&self, dst: &mut [u8]) {
        dst[..16].copy_from_slice(self);
    }
}

/// Appends the elements encoded in `src` to `dst`. `src` must hold a whole
/// number of elements.
pub fn decode_into<E: WireElement>(src: &[u8], dst: &mut Vec<E>) {
    debug_assert_eq!(src.len() % E::SIZE, 0);
    let count = src.len() / E::SIZE;
    if cfg!(target_endian = "little") {
        let start = dst.len();
        dst.resize(start + count, E::zeroed());
        bytemuck::cast_slice_mut::<E, u8>(&mut dst[start..]).copy_from_slice(src);
    } else {
        dst.extend(src.chunks_exact(E::SIZE).map(E::decode_le));
    }
}

type FinishFn<E> = Box<dyn FnOnce(Vec<E>) -> Result<AnyColumn> + Send>;

/// Decodes fixed-width elements into a buffer; `finish` turns the buffer into the
/// column once all rows are read.
pub struct FixedColumnReader<E: WireElement> {
    cursor: RowCursor,
    buffer: Vec<E>,
    finish: FinishFn<E>,
}

const INITIAL_CAPACITY_LIMIT: usize = 64 * 1024;

impl<E: WireElement> FixedColumnReader<E> {
    pub fn new(
        row_count: usize,
        finish: impl FnOnce(Vec<E>) -> Result<AnyColumn> + Send + 'static,
    ) -> FixedColumnReader<E> {
        FixedColumnReader {
            cursor: RowCursor::new(row_count),
            buffer: Vec::with_capacity(row_count.min(INITIAL_CAPACITY_LIMIT)),
            finish: Box::new(finish),
        }
    }
}

impl<E: WireElement> SkippingColumnReader for FixedColumnReader<E> {
    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.cursor.check_readable()?;
        let count = self.cursor.remaining().min(chunk.len() / E::SIZE);
        if count == 0 {
            return Ok(SequenceSize::default());
        }
        let bytes = count * E::SIZE;
        decode_into(&chunk[..bytes], &mut self.buffer);
        self.cursor.advance(count);
        trace!(
            "fixed reader: {count} elements, {}/{} rows",
            self.cursor.position(),
            self.cursor.row_count()
        );
        Ok(SequenceSize::new(bytes, count))
    }
}

impl<E: WireElement> ColumnReader for FixedColumnReader<E> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        if !self.cursor.is_complete() {
            return Err(incomplete_read(self.cursor.position(), self.cursor.row_count()));
        }
        (self.finish)(self.buffer)
    }
}

/// Advances past fixed-width elements without decoding them.
pub struct FixedSkipReader {
    cursor: RowCursor,
    element_size: usize,
}

impl FixedSkipReader {
    pub fn new(row_count: usize, element_size: usize) -> FixedSkipReader {
        debug_assert!(element_size > 0);
        FixedSkipReader {
            cursor: RowCursor::new(row_count),
            element_size,
        }
    }
}

impl SkippingColumnReader for FixedSkipReader {
    fn row_count(&self) -> usize {
        self.cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.cursor.check_readable()?;
        let count = self.cursor.remaining().min(chunk.len() / self.element_size);
        self.cursor.advance(count);
        Ok(SequenceSize::new(count * self.element_size, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;
    use chwire_common::error::ErrorKind;

    fn i32_reader(rows: usize) -> Box<FixedColumnReader<i32>> {
        Box::new(FixedColumnReader::new(rows, |values| {
            Ok(PrimitiveColumn::zero_default(values).into_any())
        }))
    }

    #[test]
    fn test_partial_elements_are_not_consumed() {
        let bytes: Vec<u8> = [1i32, -2, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut reader = i32_reader(3);
        assert_eq!(reader.read_next(&bytes[..3]).unwrap(), SequenceSize::new(0, 0));
        assert_eq!(reader.read_next(&bytes[..6]).unwrap(), SequenceSize::new(4, 1));
        assert_eq!(reader.read_next(&bytes[4..]).unwrap(), SequenceSize::new(8, 2));
        assert!(reader.is_complete());

        let err = reader.read_next(&bytes).unwrap_err();
        assert!(err.is_protocol());

        let column = reader.end_read().unwrap();
        let typed = column.try_reinterpret_as::<i32>().unwrap();
        assert_eq!(typed.as_slice(), Some(&[1, -2, 3][..]));
    }

    #[test]
    fn test_quota_limits_consumption() {
        let bytes = [0u8; 40];
        let mut reader = i32_reader(2);
        assert_eq!(reader.read_next(&bytes).unwrap(), SequenceSize::new(8, 2));
    }

    #[test]
    fn test_end_read_before_completion() {
        let mut reader = i32_reader(2);
        reader.read_next(&[0u8; 4]).unwrap();
        let err = reader.end_read().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    }

    #[test]
    fn test_zero_rows_complete_immediately() {
        let reader = i32_reader(0);
        assert!(reader.is_complete());
        assert_eq!(reader.end_read().unwrap().row_count(), 0);
    }

    #[test]
    fn test_uuid_halves() {
        let mut raw = [0u8; 16];
        [0x1122u64, 0x3344u64][..].iter().enumerate().for_each(|(i, half)| {
            half.encode_le(&mut raw[i * 8..]);
        });
        assert_eq!(<[u64; 2]>::decode_le(&raw), [0x1122, 0x3344]);
        let mut decoded = Vec::new();
        decode_into::<[u64; 2]>(&raw, &mut decoded);
        assert_eq!(decoded, vec![[0x1122, 0x3344]]);
    }

    #[test]
    fn test_skip_reader() {
        let mut reader = FixedSkipReader::new(3, 8);
        assert_eq!(reader.read_next(&[0u8; 20]).unwrap(), SequenceSize::new(16, 2));
        assert_eq!(reader.read_next(&[0u8; 20]).unwrap(), SequenceSize::new(8, 1));
        assert!(reader.is_complete());
    }
}
