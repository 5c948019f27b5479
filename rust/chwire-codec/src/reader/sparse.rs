//! Sparse serialization and the custom-mode prefix that selects it.
//!
//! A sparse column is a stream of LEB128 groups followed by the column of explicit
//! (non-default) values. A plain group `n` says that `n` default rows precede the
//! next explicit value. A group with [`END_OF_GRANULE_FLAG`] set says that `n`
//! default rows close the current granule. Decoding ends when a closing group lands
//! on the row count.

use std::sync::Arc;

use chwire_common::{Result, error::Error};
use log::{debug, warn};

use crate::column::AnyColumn;
use crate::column::sparse::SparseLayout;
use crate::types::{ColumnType, SerializationMode};

use super::{
    ChildReader, ColumnReader, SequenceSize, SkippingColumnReader, decode_varint,
    incomplete_read, read_past_end,
};

pub const END_OF_GRANULE_FLAG: u64 = 1 << 62;

const RESERVED_BIT: u64 = 1 << 63;

/// Prefix byte values of a custom-mode column.
pub const CUSTOM_MODE_DEFAULT: u8 = 0;
pub const CUSTOM_MODE_SPARSE: u8 = 1;

/// Explicit-value offsets decoded from a group stream.
#[derive(Debug, Default)]
struct GroupDecoder {
    row_count: usize,
    position: usize,
    offsets: Vec<usize>,
    done: bool,
}

impl GroupDecoder {
    fn new(row_count: usize) -> GroupDecoder {
        GroupDecoder {
            row_count,
            done: row_count == 0,
            ..Default::default()
        }
    }

    /// Consumes whole groups from `chunk` until the stream ends or the chunk runs
    /// out. Returns the consumed byte count.
    fn decode(&mut self, chunk: &[u8]) -> Result<usize> {
        let mut pos = 0;
        while !self.done {
            let Some((group, len)) = decode_varint(&chunk[pos..])? else {
                break;
            };
            pos += len;
            self.apply(group)?;
        }
        Ok(pos)
    }

    fn apply(&mut self, group: u64) -> Result<()> {
        if group & RESERVED_BIT != 0 {
            return Err(Error::protocol(format!("invalid sparse group {group:#x}")));
        }
        let size = usize::try_from(group & !END_OF_GRANULE_FLAG).unwrap_or(usize::MAX);
        let target = self.position.saturating_add(size);
        if group & END_OF_GRANULE_FLAG != 0 {
            if target >= self.row_count {
                if target > self.row_count {
                    warn!(
                        "sparse granule end at row {target} overruns the {}-row column, clamping",
                        self.row_count
                    );
                }
                self.position = self.row_count;
                self.done = true;
            } else {
                self.position = target;
            }
            return Ok(());
        }
        if target >= self.row_count {
            return Err(Error::protocol(format!(
                "sparse value offset {target} is out of range 0..{}",
                self.row_count
            )));
        }
        self.offsets.push(target);
        self.position = target + 1;
        Ok(())
    }

    fn default_rows(&self) -> usize {
        self.row_count - self.offsets.len()
    }

    fn trailing_defaults(&self) -> bool {
        self.offsets.last().is_none_or(|&last| last + 1 < self.row_count)
    }
}

enum Phase<R: ?Sized> {
    Groups,
    Values(Box<R>),
}

/// Sparse serialization: the group stream, then the explicit values column.
///
/// Default rows are reported once the group stream ends, explicit rows as the
/// values column is read.
pub struct SparseColumnReader<R: ?Sized> {
    values_type: Arc<dyn ColumnType>,
    defaults_are_null: bool,
    groups: GroupDecoder,
    phase: Phase<R>,
}

impl<R: ChildReader + ?Sized> SparseColumnReader<R> {
    pub fn new(ty: &dyn ColumnType, row_count: usize) -> Result<SparseColumnReader<R>> {
        let (values_type, defaults_are_null) = ty.sparse_values().ok_or_else(|| {
            Error::not_supported(format!("{} has no sparse serialization", ty.type_name()))
        })?;
        let phase = if row_count == 0 {
            Phase::Values(R::create(&*values_type, 0)?)
        } else {
            Phase::Groups
        };
        Ok(SparseColumnReader {
            values_type,
            defaults_are_null,
            groups: GroupDecoder::new(row_count),
            phase,
        })
    }
}

impl<R: ChildReader + ?Sized> SkippingColumnReader for SparseColumnReader<R> {
    fn row_count(&self) -> usize {
        self.groups.row_count
    }

    fn is_complete(&self) -> bool {
        match &self.phase {
            Phase::Groups => false,
            Phase::Values(values) => values.is_complete(),
        }
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count()));
        }
        let mut size = SequenceSize::default();
        if let Phase::Groups = self.phase {
            size.bytes = self.groups.decode(chunk)?;
            if !self.groups.done {
                return Ok(size);
            }
            let explicit = self.groups.offsets.len();
            debug!(
                "sparse reader: {explicit} explicit and {} default rows",
                self.groups.default_rows()
            );
            size.elements = self.groups.default_rows();
            self.phase = Phase::Values(R::create(&*self.values_type, explicit)?);
        }
        if let Phase::Values(values) = &mut self.phase {
            if !values.is_complete() {
                size += values.read_next(&chunk[size.bytes..])?;
            }
        }
        Ok(size)
    }
}

impl ColumnReader for SparseColumnReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        let this = *self;
        let Phase::Values(values) = this.phase else {
            return Err(incomplete_read(0, this.groups.row_count));
        };
        let values = values.end_read()?;
        let layout = SparseLayout {
            trailing_defaults: this.groups.trailing_defaults(),
            offsets: this.groups.offsets.into(),
            row_count: this.groups.row_count,
            defaults_are_null: this.defaults_are_null,
        };
        let kind = values.kind();
        values.try_dispatch(layout).unwrap_or_else(|| {
            Err(Error::not_supported(format!(
                "{kind} columns have no sparse serialization"
            )))
        })
    }
}

enum ModeState<R: ?Sized> {
    Prefix(Arc<dyn ColumnType>),
    Body(Box<R>),
}

/// A column preceded by a serialization-kind byte: `0` for the plain encoding,
/// `1` for sparse.
pub struct CustomModeReader<R: ?Sized> {
    row_count: usize,
    state: ModeState<R>,
}

impl<R: ChildReader + ?Sized> CustomModeReader<R> {
    pub fn new(ty: Arc<dyn ColumnType>, row_count: usize) -> Result<CustomModeReader<R>> {
        let state = if row_count == 0 {
            ModeState::Body(R::create(&*ty, 0)?)
        } else {
            ModeState::Prefix(ty)
        };
        Ok(CustomModeReader { row_count, state })
    }
}

impl<R: ChildReader + ?Sized> SkippingColumnReader for CustomModeReader<R> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn is_complete(&self) -> bool {
        match &self.state {
            ModeState::Prefix(_) => false,
            ModeState::Body(body) => body.is_complete(),
        }
    }

    fn read_next(&mut self, chunk: &[u8]) -> Result<SequenceSize> {
        if self.is_complete() {
            return Err(read_past_end(self.row_count));
        }
        let mut consumed = 0;
        if let ModeState::Prefix(ty) = &self.state {
            let Some(&prefix) = chunk.first() else {
                return Ok(SequenceSize::default());
            };
            let mode = match prefix {
                CUSTOM_MODE_DEFAULT => SerializationMode::Default,
                CUSTOM_MODE_SPARSE => SerializationMode::Sparse,
                other => {
                    return Err(Error::protocol(format!(
                        "unexpected serialization kind {other}"
                    )));
                }
            };
            debug!("custom mode reader: {mode:?} serialization");
            let body = R::create_with_mode(ty.clone(), self.row_count, mode)?;
            self.state = ModeState::Body(body);
            consumed = 1;
        }
        let ModeState::Body(body) = &mut self.state else {
            return Ok(SequenceSize::new(consumed, 0));
        };
        let mut size = body.read_next(&chunk[consumed..])?;
        size.bytes += consumed;
        Ok(size)
    }
}

impl ColumnReader for CustomModeReader<dyn ColumnReader> {
    fn end_read(self: Box<Self>) -> Result<AnyColumn> {
        let this = *self;
        match this.state {
            ModeState::Prefix(_) => Err(incomplete_read(0, this.row_count)),
            ModeState::Body(body) => body.end_read(),
        }
    }
}
