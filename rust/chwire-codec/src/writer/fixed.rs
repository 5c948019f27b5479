use chwire_common::Result;

use crate::column::ColumnRef;
use crate::reader::fixed::WireElement;
use crate::reader::{RowCursor, SequenceSize};
use crate::value::ColumnValue;

use super::ColumnWriter;

type EncodeFn<S, E> = Box<dyn Fn(S) -> Result<E> + Send>;

/// Encodes each row of `source` into a fixed-width wire element. Null rows are
/// written as `null_value`.
pub struct FixedColumnWriter<S, E> {
    name: String,
    source: ColumnRef<S>,
    cursor: RowCursor,
    encode: EncodeFn<S, E>,
    null_value: E,
}

impl<S: ColumnValue, E: WireElement> FixedColumnWriter<S, E> {
    pub fn new(
        name: &str,
        source: ColumnRef<S>,
        encode: impl Fn(S) -> Result<E> + Send + 'static,
    ) -> FixedColumnWriter<S, E> {
        FixedColumnWriter {
            name: name.to_string(),
            cursor: RowCursor::new(source.row_count()),
            source,
            encode: Box::new(encode),
            null_value: E::zeroed(),
        }
    }

    pub fn with_null_value(mut self, null_value: E) -> Self {
        self.null_value = null_value;
        self
    }
}

impl<S: ColumnValue, E: WireElement> ColumnWriter for FixedColumnWriter<S, E> {
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
        let count = self.cursor.remaining().min(dst.len() / E::SIZE);
        let start = self.cursor.position();
        for (i, out) in dst.chunks_exact_mut(E::SIZE).take(count).enumerate() {
            let row = start + i;
            let element = if self.source.is_null(row) {
                self.null_value
            } else {
                (self.encode)(self.source.value(row)?)?
            };
            element.encode_le(out);
        }
        self.cursor.advance(count);
        Ok(SequenceSize::new(count * E::SIZE, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{NullableColumn, PrimitiveColumn};
    use crate::writer::write_to_vec;
    use chwire_common::error::Error;
    use std::sync::Arc;

    #[test]
    fn test_writes_whole_elements_only() {
        let source: ColumnRef<i32> = Arc::new(PrimitiveColumn::new(vec![1, -1, 256]));
        let mut writer = FixedColumnWriter::new("n", source, Ok::<i32, Error>);
        let mut dst = [0u8; 6];
        assert_eq!(writer.write_next(&mut dst).unwrap(), SequenceSize::new(4, 1));
        assert_eq!(&dst[..4], &1i32.to_le_bytes());
        let mut dst = [0u8; 16];
        assert_eq!(writer.write_next(&mut dst).unwrap(), SequenceSize::new(8, 2));
        assert!(writer.is_complete());
        assert_eq!(writer.write_next(&mut dst).unwrap(), SequenceSize::default());
    }

    #[test]
    fn test_null_rows_use_placeholder() {
        let source: ColumnRef<u8> =
            Arc::new(NullableColumn::from_options(vec![Some(5u8), None], 0));
        let mut writer = FixedColumnWriter::new("n", source, Ok::<u8, Error>).with_null_value(9);
        assert_eq!(write_to_vec(&mut writer, 1).unwrap(), vec![5, 9]);
    }
}
