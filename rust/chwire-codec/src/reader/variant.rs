use std::sync::Arc;

use chwire_common::{Result, error::Error, verify_data};
use log::debug;

use crate::column::variant::NULL_DISCRIMINATOR;
use crate::column::{AnyColumn, VariantColumn};
use crate::types::ColumnType;

use super::{
    ChildReader, ColumnReader, RowCursor, SequenceSize, SkippingColumnReader, incomplete_read,
    read_past_end,
};

/// The only discriminator mode understood: one tag byte per row.
pub const BASIC_DISCRIMINATOR_MODE: u64 = 0;

enum Phase<R: ?Sized> {
    Mode,
    Tags,
    Children { readers: Vec<Box<R>>, current: usize },
}

/// `Variant(T1, ..., Tn)`: a `u64` discriminator mode, one tag byte per row, then
/// the column of each variant holding exactly the rows tagged with it.
pub struct VariantColumnReader<R: ?Sized> {
    types: Vec<Arc<dyn ColumnType>>,
    tags: RowCursor,
    tag_buffer: Vec<u8>,
    phase: Phase<R>,
}

impl<R: ChildReader + ?Sized> VariantColumnReader<R> {
    pub fn new(types: Vec<Arc<dyn ColumnType>>, row_count: usize) -> Result<VariantColumnReader<R>> {
        if types.len() >= usize::from(NULL_DISCRIMINATOR) {
            return Err(Error::invalid_arg(
                "types",
                format!("{} variants do not fit in a tag byte", types.len()),
            ));
        }
        let mut reader = VariantColumnReader {
            types,
            tags: RowCursor::new(row_count),
            tag_buffer: Vec::with_capacity(row_count.min(64 * 1024)),
            phase: Phase::Mode,
        };
        if row_count == 0 {
            reader.start_children()?;
        }
        Ok(reader)
    }

    fn start_children(&mut self) -> Result<()> {
        let mut counts = vec![0usize; self.types.len()];
        for &tag in &self.tag_buffer {
            if tag != NULL_DISCRIMINATOR {
                counts[usize::from(tag)] += 1;
            }
        }
        debug!("variant reader: rows per variant {counts:?}");
        let readers = self
            .types
            .iter()
            .zip(counts)
            .map(|(ty, count)| R::create(&**ty, count))
            .collect::<Result<Vec<_>>>()?;
        self.phase = Phase::Children {
            readers,
            current: 0,
        };
        Ok(())
    }

    fn read_tags(&mut self, chunk: &[u8]) -> Result<usize> {
        let count = self.tags.remaining().min(chunk.len());
        let variants = self.types.len();
        for &tag in &chunk[..count] {
            verify_data!(
                tag,
                tag == NULL_DISCRIMINATOR || usize::from(tag) < variants
            );
        }
        self.tag_buffer.extend_from_slice(&chunk[..count]);
        self.tags.advance(count);
        Ok(count)
    }

    fn children_complete(&self) -> bool {
        match &self.phase {
            Phase::Children { readers, .. } => readers.iter().all(|r| r.is_complete()),
            _ => false,
        }
    }
}

impl<R: ChildReader + ?Sized> SkippingColumnReader for VariantColumnReader<R> {
    fn row_count(&self) -> usize {
        self.tags.row_count()
    }

    fn is_complete(&self) -> bool {
        self.children_complete()
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count()));
        }
        let mut consumed = 0;
        if let Phase::Mode = self.phase {
            if chunk.len() < 8 {
                return Ok(SequenceSize::default());
            }
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&chunk[..8]);
            let mode = u64::from_le_bytes(raw);
            if mode != BASIC_DISCRIMINATOR_MODE {
                return Err(Error::protocol(format!(
                    "unsupported variant discriminator mode {mode}"
                )));
            }
            consumed = 8;
            self.phase = Phase::Tags;
        }
        if let Phase::Tags = self.phase {
            consumed += self.read_tags(&chunk[consumed..])?;
            if !self.tags.is_complete() {
                return Ok(SequenceSize::new(consumed, 0));
            }
            self.start_children()?;
        }
        let Phase::Children { readers, current } = &mut self.phase else {
            return Ok(SequenceSize::new(consumed, 0));
        };
        while *current < readers.len() {
            let reader = &mut readers[*current];
            if !reader.is_complete() {
                let size = reader.read_next(&chunk[consumed..])?;
                consumed += size.bytes;
                if !reader.is_complete() {
                    return Ok(SequenceSize::new(consumed, 0));
                }
            }
            *current += 1;
        }
        Ok(SequenceSize::new(consumed, self.tags.row_count()))
    }
}

impl ColumnReader for VariantColumnReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        let this = *self;
        let Phase::Children { readers, .. } = this.phase else {
            return Err(incomplete_read(0, this.tags.row_count()));
        };
        let children = readers
            .into_iter()
            .map(|reader| reader.end_read())
            .collect::<Result<Vec<_>>>()?;
        Ok(AnyColumn::Variant(VariantColumn::new(
            this.tag_buffer,
            children,
        )?))
    }
}
