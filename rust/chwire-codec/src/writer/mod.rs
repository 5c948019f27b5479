//! Incremental column encoders.
//!
//! A writer serializes the rows of a column into caller-provided output buffers.
//! Every [`ColumnWriter::write_next`] call writes as many whole elements as fit
//! and reports the bytes and rows it produced; a writer with nothing left to
//! write reports zero. Readers decode exactly what writers produce.

use chwire_common::{Result, error::Error};

use crate::column::{AnyColumn, ColumnRef};
use crate::reader::SequenceSize;
use crate::types::ColumnType;
use crate::value::ColumnValue;

pub mod array;
pub mod fixed;
pub mod nullable;
pub mod sparse;
pub mod string;
pub mod tuple;
pub mod variant;

pub use fixed::FixedColumnWriter;

pub trait ColumnWriter: Send {
    /// The column name, for diagnostics.
    fn column_name(&self) -> &str;

    fn row_count(&self) -> usize;

    fn is_complete(&self) -> bool;

    fn write_next(&mut self, dst: &mut [u8]) -> Result<SequenceSize>;
}

/// Views `column` as `T` values, the input a writer of `ty` accepts. Columns of
/// other value kinds are rejected with a not-supported error.
pub fn require<T: ColumnValue>(
    ty: &dyn ColumnType,
    name: &str,
    column: &AnyColumn,
) -> Result<ColumnRef<T>> {
    T::from_any(column).ok_or_else(|| {
        Error::not_supported(format!(
            "column '{name}' of type {} cannot be written from {} values",
            ty.type_name(),
            column.kind()
        ))
    })
}

const MAX_STEP_BYTES: usize = 1 << 30;

/// Drains `writer` into a vector, offering `chunk_size` bytes per step. The step
/// grows while a single element does not fit.
pub fn write_to_vec(writer: &mut dyn ColumnWriter, chunk_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut step = chunk_size.max(1);
    while !writer.is_complete() {
        let start = out.len();
        out.resize(start + step, 0);
        let size = writer.write_next(&mut out[start..])?;
        out.truncate(start + size.bytes);
        if size.is_empty() {
            if step >= MAX_STEP_BYTES {
                return Err(Error::invalid_operation(format!(
                    "writing column '{}': no progress with a {step}-byte buffer",
                    writer.column_name()
                )));
            }
            step = (step * 2).min(MAX_STEP_BYTES);
        }
    }
    Ok(out)
}

/// Writes the whole column in one buffer.
pub fn write_column(writer: &mut dyn ColumnWriter) -> Result<Vec<u8>> {
    write_to_vec(writer, 64 * 1024)
}
