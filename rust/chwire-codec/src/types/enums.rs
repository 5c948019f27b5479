use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::column::enums::{EnumColumn, EnumDictionary, EnumKey};
use crate::column::{AnyColumn, ColumnRef, PrimitiveColumn};
use crate::reader::fixed::{FixedColumnReader, FixedSkipReader, WireElement};
use crate::reader::{ColumnReader, SkippingColumnReader};
use crate::value::{ScalarValue, ValueKind};
use crate::writer::{ColumnWriter, FixedColumnWriter, require};

use super::{ColumnType, TypeArg, TypeName};

/// `Enum8` and `Enum16`: integer codes on the wire, member names in memory.
#[derive(Debug, Clone)]
pub struct EnumType {
    wide: bool,
    dictionary: Arc<EnumDictionary>,
}

impl EnumType {
    pub fn enum8<I, S>(members: I) -> Result<EnumType>
    where
        I: IntoIterator<Item = (S, i16)>,
        S: Into<String>,
    {
        let dictionary = EnumDictionary::new(members)?;
        if let Some((name, key)) = dictionary
            .members()
            .into_iter()
            .find(|&(_, key)| i8::try_from(key).is_err())
        {
            return Err(Error::invalid_arg(
                "members",
                format!("Enum8 member '{name}' = {key} is out of the Int8 range"),
            ));
        }
        Ok(EnumType::with_dictionary(false, dictionary))
    }

    pub fn enum16<I, S>(members: I) -> Result<EnumType>
    where
        I: IntoIterator<Item = (S, i16)>,
        S: Into<String>,
    {
        Ok(EnumType::with_dictionary(true, EnumDictionary::new(members)?))
    }

    fn with_dictionary(wide: bool, dictionary: EnumDictionary) -> EnumType {
        EnumType {
            wide,
            dictionary: Arc::new(dictionary),
        }
    }

    pub fn dictionary(&self) -> &EnumDictionary {
        &self.dictionary
    }

    fn reader<K>(&self, row_count: usize) -> Box<dyn ColumnReader>
    where
        K: WireElement + EnumKey + Default + TryFrom<i16>,
    {
        let dictionary = self.dictionary.clone();
        // Default rows hold the smallest member code, matching the name default.
        let default_key = dictionary
            .min_key()
            .and_then(|key| K::try_from(key).ok())
            .unwrap_or_default();
        Box::new(FixedColumnReader::<K>::new(row_count, move |raw| {
            let keys: ColumnRef<K> = Arc::new(PrimitiveColumn::new(raw).with_default(default_key));
            Ok(EnumColumn::new(keys, dictionary).into_any())
        }))
    }

    fn writer<K>(&self, name: &str, column: &AnyColumn) -> Result<Box<dyn ColumnWriter>>
    where
        K: WireElement + ScalarValue + TryFrom<i16>,
    {
        let type_name = self.type_name();
        let to_wire = move |key: i16| {
            K::try_from(key).map_err(|_| {
                Error::overflow(format!("enum code {key} does not fit {type_name}"))
            })
        };
        let placeholder = self
            .dictionary
            .min_key()
            .and_then(|key| K::try_from(key).ok())
            .unwrap_or_else(K::zeroed);

        let dictionary = self.dictionary.clone();
        let writer: Box<dyn ColumnWriter> = if column.kind() == ValueKind::String {
            let source = require::<String>(self, name, column)?;
            Box::new(
                FixedColumnWriter::new(name, source, move |member: String| {
                    let key = dictionary.key(&member).ok_or_else(|| {
                        Error::invalid_cast(format!("'{member}' is not an enum member"))
                    })?;
                    to_wire(key)
                })
                .with_null_value(placeholder),
            )
        } else {
            let source = require::<i16>(self, name, column)?;
            Box::new(
                FixedColumnWriter::new(name, source, move |key: i16| {
                    if dictionary.name(key).is_none() {
                        return Err(Error::invalid_cast(format!(
                            "{key} is not an enum member code"
                        )));
                    }
                    to_wire(key)
                })
                .with_null_value(placeholder),
            )
        };
        Ok(writer)
    }
}

impl ColumnType for EnumType {
    fn type_name(&self) -> TypeName {
        let args = self
            .dictionary
            .members()
            .into_iter()
            .map(|(name, key)| TypeArg::EnumMember(name.to_string(), i64::from(key)))
            .collect();
        TypeName::with_args(if self.wide { "Enum16" } else { "Enum8" }, args)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(if self.wide {
            self.reader::<i16>(row_count)
        } else {
            self.reader::<i8>(row_count)
        })
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        let size = if self.wide { 2 } else { 1 };
        Ok(Box::new(FixedSkipReader::new(row_count, size)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        Some((self.boxed(), false))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        if self.wide {
            self.writer::<i16>(name, column)
        } else {
            self.writer::<i8>(name, column)
        }
    }
}
