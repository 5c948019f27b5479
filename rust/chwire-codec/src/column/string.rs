//! Variable-length byte storage and the string and binary columns over it.
//!
//! Decoded strings are kept in the segments they arrived in. Each row is a
//! [`ValueLayout`] record pointing into one segment, so no single allocation
//! has to hold the whole column.

use std::sync::Arc;

use bytes::Bytes;
use chwire_common::Result;

use crate::value::ValueKind;

use super::{AnyColumn, Column, row_out_of_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLayout {
    pub segment: usize,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Default, Clone)]
pub struct SegmentedBytes {
    segments: Vec<Bytes>,
    layouts: Vec<ValueLayout>,
}

impl SegmentedBytes {
    pub fn new() -> SegmentedBytes {
        Default::default()
    }

    /// Packs `values` into a single segment.
    pub fn from_values<I, V>(values: I) -> SegmentedBytes
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        let mut buf = Vec::new();
        let mut ranges = Vec::new();
        for value in values {
            let value = value.as_ref();
            ranges.push((buf.len(), value.len()));
            buf.extend_from_slice(value);
        }
        let mut data = SegmentedBytes::new();
        data.push_segment(Bytes::from(buf), ranges);
        data
    }

    /// Appends a segment along with the `(offset, length)` ranges of the values it
    /// holds, relative to the segment start.
    pub fn push_segment(
        &mut self,
        segment: Bytes,
        ranges: impl IntoIterator<Item = (usize, usize)>,
    ) {
        let index = self.segments.len();
        self.layouts.extend(ranges.into_iter().map(|(offset, length)| {
            debug_assert!(offset + length <= segment.len());
            ValueLayout {
                segment: index,
                offset,
                length,
            }
        }));
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn layout(&self, index: usize) -> Option<ValueLayout> {
        self.layouts.get(index).copied()
    }

    pub fn get_slice(&self, index: usize) -> Option<&[u8]> {
        let layout = self.layouts.get(index)?;
        let segment = &self.segments[layout.segment];
        Some(&segment[layout.offset..layout.offset + layout.length])
    }

    /// Zero-copy handle to the value bytes.
    pub fn get(&self, index: usize) -> Option<Bytes> {
        let layout = self.layouts.get(index)?;
        Some(self.segments[layout.segment].slice(layout.offset..layout.offset + layout.length))
    }
}

fn trim_zeros(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    &bytes[..end]
}

/// Text view over segmented bytes. Invalid UTF-8 is reported when the row is
/// accessed, as an invalid-cast error.
pub struct StringColumn {
    data: Arc<SegmentedBytes>,
    trim_zeros: bool,
}

impl StringColumn {
    pub fn new(data: Arc<SegmentedBytes>) -> StringColumn {
        StringColumn {
            data,
            trim_zeros: false,
        }
    }

    /// Text view over `FixedString` data: trailing zero padding is not part of
    /// the string.
    pub fn fixed(data: Arc<SegmentedBytes>) -> StringColumn {
        StringColumn {
            data,
            trim_zeros: true,
        }
    }

    pub fn from_strings<I, S>(values: I) -> StringColumn
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StringColumn::new(Arc::new(SegmentedBytes::from_values(
            values.into_iter().map(|s| s.as_ref().as_bytes().to_vec()),
        )))
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::String(Arc::new(self))
    }

    fn bytes(&self, index: usize) -> Result<&[u8]> {
        let bytes = self
            .data
            .get_slice(index)
            .ok_or_else(|| row_out_of_range(index, self.data.len()))?;
        Ok(if self.trim_zeros {
            trim_zeros(bytes)
        } else {
            bytes
        })
    }
}

impl Column<String> for StringColumn {
    fn row_count(&self) -> usize {
        self.data.len()
    }

    fn value(&self, index: usize) -> Result<String> {
        Ok(std::str::from_utf8(self.bytes(index)?)?.to_owned())
    }

    fn default_value(&self) -> Option<String> {
        Some(String::new())
    }

    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        match target {
            ValueKind::Bytes if !self.trim_zeros => {
                Some(AnyColumn::Bytes(Arc::new(BytesColumn::new(self.data.clone()))))
            }
            _ => None,
        }
    }
}

/// Raw byte view over segmented bytes, used for `FixedString` and for strings
/// read as bytes.
pub struct BytesColumn {
    data: Arc<SegmentedBytes>,
    fixed_size: Option<usize>,
}

impl BytesColumn {
    pub fn new(data: Arc<SegmentedBytes>) -> BytesColumn {
        BytesColumn {
            data,
            fixed_size: None,
        }
    }

    pub fn fixed(data: Arc<SegmentedBytes>, size: usize) -> BytesColumn {
        BytesColumn {
            data,
            fixed_size: Some(size),
        }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::Bytes(Arc::new(self))
    }
}

impl Column<Bytes> for BytesColumn {
    fn row_count(&self) -> usize {
        self.data.len()
    }

    fn value(&self, index: usize) -> Result<Bytes> {
        self.data
            .get(index)
            .ok_or_else(|| row_out_of_range(index, self.data.len()))
    }

    fn default_value(&self) -> Option<Bytes> {
        Some(match self.fixed_size {
            Some(size) => Bytes::from(vec![0u8; size]),
            None => Bytes::new(),
        })
    }

    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        match target {
            ValueKind::String => {
                let column = match self.fixed_size {
                    Some(_) => StringColumn::fixed(self.data.clone()),
                    None => StringColumn::new(self.data.clone()),
                };
                Some(column.into_any())
            }
            _ => None,
        }
    }
}
