use chwire_common::{Result, error::Error};

use crate::reader::SequenceSize;

use super::ColumnWriter;

/// `Tuple(T1, ..., Tn)`: each element column in turn.
pub struct TupleColumnWriter {
    children: Vec<Box<dyn ColumnWriter>>,
    current: usize,
}

impl TupleColumnWriter {
    pub fn new(children: Vec<Box<dyn ColumnWriter>>) -> Result<TupleColumnWriter> {
        let Some(first) = children.first() else {
            return Err(Error::invalid_arg("children", "a tuple needs at least one element"));
        };
        let rows = first.row_count();
        if children.iter().any(|c| c.row_count() != rows) {
            return Err(Error::invalid_arg(
                "children",
                "tuple elements must have equal row counts",
            ));
        }
        Ok(TupleColumnWriter {
            children,
            current: 0,
        })
    }
}

impl ColumnWriter for TupleColumnWriter {
    fn column_name(&self) -> &str {
        self.children[0].column_name()
    }

    fn row_count(&self) -> usize {
        self.children[0].row_count()
    }

    fn is_complete(&self) -> bool {
        self.children.iter().all(|c| c.is_complete())
    }

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize> {
        let last = self.children.len() - 1;
        let mut written = 0;
        while self.current < last {
            let child = &mut self.children[self.current];
            if !child.is_complete() {
                written += child.write_next(&mut dst[written..])?.bytes;
                if !child.is_complete() {
                    return Ok(SequenceSize::new(written, 0));
                }
            }
            self.current += 1;
        }
        let size = self.children[last].write_next(&mut dst[written..])?;
        Ok(SequenceSize::new(written + size.bytes, size.elements))
    }
}
