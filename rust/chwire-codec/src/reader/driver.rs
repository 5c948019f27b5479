use bytes::{Buf, BytesMut};
use chwire_common::Result;
use log::{debug, trace};

use crate::column::AnyColumn;

use super::{ColumnReader, SequenceSize, SkippingColumnReader};

/// Keeps the bytes a reader could not consume yet, so that callers can push
/// chunks split at arbitrary boundaries.
pub struct ChunkedReadDriver<R: ?Sized> {
    reader: Box<R>,
    pending: BytesMut,
    elements: usize,
}

impl<R: SkippingColumnReader + ?Sized> ChunkedReadDriver<R> {
    pub fn new(reader: Box<R>) -> ChunkedReadDriver<R> {
        ChunkedReadDriver {
            reader,
            pending: BytesMut::new(),
            elements: 0,
        }
    }

    /// Appends `chunk` and lets the reader consume as much as it can. Returns the
    /// progress made by this push. Bytes left over once the reader is complete
    /// stay pending.
    pub fn push(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        self.pending.extend_from_slice(chunk);
        let mut total = SequenceSize::default();
        while !self.reader.is_complete() {
            let size = self.reader.read_next(&self.pending)?;
            if size.is_empty() {
                break;
            }
            trace!(
                "driver: consumed {} bytes, {} elements",
                size.bytes, size.elements
            );
            self.pending.advance(size.bytes);
            total += size;
        }
        self.elements += total.elements;
        Ok(total)
    }

    pub fn is_complete(&self) -> bool {
        self.reader.is_complete()
    }

    /// Rows reported by the reader so far.
    pub fn elements(&self) -> usize {
        self.elements
    }

    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn into_reader(self) -> Box<R> {
        self.reader
    }
}

impl ChunkedReadDriver<dyn ColumnReader> {
    pub fn finish(self) -> Result<AnyColumn> {
        debug!(
            "driver: finishing a {}-row column, {} bytes left over",
            self.reader.row_count(),
            self.pending.len()
        );
        self.reader.end_read()
    }
}
