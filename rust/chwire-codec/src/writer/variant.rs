use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::column::VariantColumn;
use crate::column::variant::NULL_DISCRIMINATOR;
use crate::reader::variant::BASIC_DISCRIMINATOR_MODE;
use crate::reader::{RowCursor, SequenceSize};

use super::ColumnWriter;

/// `Variant(T1, ..., Tn)`: the discriminator mode, the tags, then every variant's
/// column.
///
/// Variant columns are written in tag order: the n-th row tagged `t` must refer
/// to row n of variant `t`.
pub struct VariantColumnWriter {
    name: String,
    tags: Arc<[u8]>,
    mode_written: bool,
    tag_cursor: RowCursor,
    children: Vec<Box<dyn ColumnWriter>>,
    current: usize,
}

impl VariantColumnWriter {
    pub fn new(
        name: &str,
        column: &VariantColumn,
        children: Vec<Box<dyn ColumnWriter>>,
    ) -> Result<VariantColumnWriter> {
        if children.len() != column.children().len() {
            return Err(Error::invalid_arg(
                "children",
                format!(
                    "{} writers for {} variants",
                    children.len(),
                    column.children().len()
                ),
            ));
        }
        let mut counts = vec![0usize; children.len()];
        for (row, (&tag, &index)) in column.tags().iter().zip(column.indices()).enumerate() {
            if tag == NULL_DISCRIMINATOR {
                continue;
            }
            let count = &mut counts[usize::from(tag)];
            if index as usize != *count {
                return Err(Error::invalid_arg(
                    "variant",
                    format!("row {row} refers to row {index} of variant {tag}, expected {count}"),
                ));
            }
            *count += 1;
        }
        for (tag, (child, count)) in children.iter().zip(&counts).enumerate() {
            if child.row_count() != *count {
                return Err(Error::invalid_arg(
                    "variant",
                    format!(
                        "variant {tag} has {} rows, {count} are referenced",
                        child.row_count()
                    ),
                ));
            }
        }
        Ok(VariantColumnWriter {
            name: name.to_string(),
            tags: column.tags().into(),
            mode_written: false,
            tag_cursor: RowCursor::new(column.row_count()),
            children,
            current: 0,
        })
    }
}

impl ColumnWriter for VariantColumnWriter {
    fn column_name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.tag_cursor.row_count()
    }

    fn is_complete(&self) -> bool {
        self.row_count() == 0
            || (self.tag_cursor.is_complete() && self.current == self.children.len())
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Ok(SequenceSize::default());
        }
        let mut written = 0;
        if !self.mode_written {
            if dst.len() < 8 {
                return Ok(SequenceSize::default());
            }
            dst[..8].copy_from_slice(&BASIC_DISCRIMINATOR_MODE.to_le_bytes());
            self.mode_written = true;
            written = 8;
        }
        if !self.tag_cursor.is_complete() {
            let count = self.tag_cursor.remaining().min(dst.len() - written);
            let start = self.tag_cursor.position();
            dst[written..written + count].copy_from_slice(&self.tags[start..start + count]);
            self.tag_cursor.advance(count);
            written += count;
            if !self.tag_cursor.is_complete() {
                return Ok(SequenceSize::new(written, 0));
            }
        }
        while self.current < self.children.len() {
            let child = &mut self.children[self.current];
            if !child.is_complete() {
                written += child.write_next(&mut dst[written..])?.bytes;
                if !child.is_complete() {
                    return Ok(SequenceSize::new(written, 0));
                }
            }
            self.current += 1;
        }
        Ok(SequenceSize::new(written, self.row_count()))
    }
}
