use chwire_common::{Result, error::Error};

use crate::column::{AnyColumn, TupleColumn};

use super::{ChildReader, ColumnReader, SequenceSize, SkippingColumnReader, read_past_end};

/// `Tuple(T1, ..., Tn)`: the complete column of each element type in turn.
///
/// Rows are reported as the last element column is read, since only then is a
/// row fully available.
pub struct TupleColumnReader<R: ?Sized> {
    row_count: usize,
    children: Vec<Box<R>>,
    current: usize,
    names: Option<Vec<String>>,
}

impl<R: ChildReader + ?Sized> TupleColumnReader<R> {
    pub fn new(children: Vec<Box<R>>, row_count: usize) -> Result<TupleColumnReader<R>> {
        if children.is_empty() {
            return Err(Error::invalid_arg("children", "a tuple needs at least one element"));
        }
        if let Some(child) = children.iter().find(|c| c.row_count() != row_count) {
            return Err(Error::invalid_arg(
                "children",
                format!("element reader sized for {} of {row_count} rows", child.row_count()),
            ));
        }
        Ok(TupleColumnReader {
            row_count,
            children,
            current: 0,
            names: None,
        })
    }

    pub fn with_names(mut self, names: Option<Vec<String>>) -> Self {
        self.names = names;
        self
    }
}

impl<R: ChildReader + ?Sized> SkippingColumnReader for TupleColumnReader<R> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn is_complete(&self) -> bool {
        self.children.iter().all(|child| child.is_complete())
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count));
        }
        let last = self.children.len() - 1;
        let mut consumed = 0;
        while self.current < last && self.children[self.current].is_complete() {
            self.current += 1;
        }
        while self.current < last {
            let size = self.children[self.current].read_next(&chunk[consumed..])?;
            consumed += size.bytes;
            if !self.children[self.current].is_complete() {
                return Ok(SequenceSize::new(consumed, 0));
            }
            self.current += 1;
        }
        let size = self.children[last].read_next(&chunk[consumed..])?;
        Ok(SequenceSize::new(consumed + size.bytes, size.elements))
    }
}

impl ColumnReader for TupleColumnReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        let this = *self;
        let children = this
            .children
            .into_iter()
            .map(|child| child.end_read())
            .collect::<Result<Vec<_>>>()?;
        let tuple = TupleColumn::new(children)?;
        let tuple = match this.names {
            Some(names) => tuple.with_names(names)?,
            None => tuple,
        };
        Ok(AnyColumn::Tuple(tuple))
    }
}
