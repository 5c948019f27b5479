use std::sync::Arc;

use bytes::Bytes;
use chwire_common::{Result, verify_arg};

use crate::column::AnyColumn;
use crate::reader::string::{FixedStringReader, StringColumnReader, StringSkipReader};
use crate::reader::fixed::FixedSkipReader;
use crate::reader::{ColumnReader, SkippingColumnReader};
use crate::value::ValueKind;
use crate::writer::string::{FixedStringWriter, StringColumnWriter};
use crate::writer::{ColumnWriter, require};

use super::{ColumnType, TypeArg, TypeName};

/// `String`: arbitrary bytes, decoded as UTF-8 on access.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

impl ColumnType for StringType {
    fn type_name(&self) -> TypeName {
        TypeName::new("String")
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(Box::new(StringColumnReader::new(row_count)))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(StringSkipReader::new(row_count)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let source = require::<Bytes>(self, name, column)?;
        Ok(Box::new(StringColumnWriter::new(name, source)))
    }
}

/// `FixedString(N)`: exactly `N` bytes per row, zero padded.
#[derive(Debug, Clone, Copy)]
pub struct FixedStringType {
    size: usize,
}

impl FixedStringType {
    pub fn new(size: usize) -> Result<FixedStringType> {
        verify_arg!(size, size > 0);
        Ok(FixedStringType { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl ColumnType for FixedStringType {
    fn type_name(&self) -> TypeName {
        TypeName::with_args("FixedString", vec![TypeArg::Number(self.size as i64)])
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Bytes
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(*self)
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(Box::new(FixedStringReader::new(row_count, self.size)))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(FixedSkipReader::new(row_count, self.size)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let source = require::<Bytes>(self, name, column)?;
        Ok(Box::new(FixedStringWriter::new(name, source, self.size)))
    }
}
