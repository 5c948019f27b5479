//! Wire type descriptors.
//!
//! A [`ColumnType`] describes one server column type and creates the readers and
//! writers for it. Descriptors are immutable and shared; server settings are
//! applied through [`ColumnType::configure`], which derives a new descriptor.

use std::fmt;
use std::sync::Arc;

use chrono_tz::Tz;
use chwire_common::{Result, error::Error};
use log::debug;

use crate::column::AnyColumn;
use crate::reader::{ColumnReader, SkippingColumnReader, create_reader, create_skipping_reader};
use crate::value::ValueKind;
use crate::writer::ColumnWriter;

pub mod composite;
pub mod datetime;
pub mod decimal;
pub mod enums;
pub mod name;
pub mod resolve;
pub mod scalar;
pub mod string;

pub use name::{TypeArg, TypeName, parse_type_name};

pub trait ColumnType: Send + Sync + fmt::Debug + 'static {
    fn type_name(&self) -> TypeName;

    /// The value kind of the columns this type decodes into.
    fn value_kind(&self) -> ValueKind;

    fn boxed(&self) -> Arc<dyn ColumnType>;

    /// Applies server settings. Returns `None` when the settings do not affect
    /// this type.
    fn configure(&self, _settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        None
    }

    /// Reader for the plain (non-sparse) encoding of `row_count` rows.
    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>>;

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        let reader: Box<dyn SkippingColumnReader> = self.create_plain_reader(row_count)?;
        Ok(reader)
    }

    /// The type of the explicit values in sparse serialization, and whether the
    /// default rows are null. `None` when the type has no sparse serialization.
    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        None
    }

    /// Creates a writer serializing `column`. Fails with a not-supported error
    /// when the column's values are not accepted by this type.
    fn create_column_writer(&self, name: &str, column: &AnyColumn)
    -> Result<Box<dyn ColumnWriter>>;

    fn create_column_reader(
        &self,
        row_count: usize,
        mode: SerializationMode,
    ) -> Result<Box<dyn ColumnReader>> {
        create_reader(self.boxed(), row_count, mode)
    }

    fn create_skipping_column_reader(
        &self,
        row_count: usize,
        mode: SerializationMode,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        create_skipping_reader(self.boxed(), row_count, mode)
    }
}

/// Applies `settings` to `ty`, keeping `ty` when nothing changes.
pub fn configure_type(ty: &Arc<dyn ColumnType>, settings: &TypeSettings) -> Arc<dyn ColumnType> {
    ty.configure(settings).unwrap_or_else(|| ty.clone())
}

/// How a column's values are laid out on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializationMode {
    /// The plain encoding.
    #[default]
    Default,
    /// Sparse groups, then the explicit values.
    Sparse,
    /// A prefix byte choosing between the two above.
    Custom,
}

/// Server-specific settings applied to type descriptors.
#[derive(Debug, Clone)]
pub struct TypeSettings {
    /// Zone of `DateTime` and `DateTime64` columns declared without one.
    pub time_zone: Tz,
    /// Whether the server may send columns with a serialization-kind prefix.
    pub sparse_serialization: bool,
}

impl Default for TypeSettings {
    fn default() -> Self {
        TypeSettings {
            time_zone: Tz::UTC,
            sparse_serialization: true,
        }
    }
}

impl TypeSettings {
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_sparse_serialization(mut self, enabled: bool) -> Self {
        self.sparse_serialization = enabled;
        self
    }

    /// The mode to read a column in, given whether its block announced custom
    /// serialization.
    pub fn serialization_mode(&self, has_custom: bool) -> Result<SerializationMode> {
        match (has_custom, self.sparse_serialization) {
            (false, _) => Ok(SerializationMode::Default),
            (true, true) => Ok(SerializationMode::Custom),
            (true, false) => Err(Error::protocol(
                "custom serialization received while sparse serialization is disabled",
            )),
        }
    }
}

/// Resolves type names into configured descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    settings: TypeSettings,
}

impl TypeRegistry {
    pub fn new(settings: TypeSettings) -> TypeRegistry {
        TypeRegistry { settings }
    }

    pub fn settings(&self) -> &TypeSettings {
        &self.settings
    }

    pub fn resolve(&self, type_name: &str) -> Result<Arc<dyn ColumnType>> {
        let name = parse_type_name(type_name)?;
        let ty = resolve::build_type(&name)?;
        let ty = configure_type(&ty, &self.settings);
        debug!("resolved column type {type_name} as {ty:?}");
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chwire_common::error::ErrorKind;

    #[test]
    fn test_serialization_mode() {
        let settings = TypeSettings::default();
        assert_eq!(settings.serialization_mode(false).unwrap(), SerializationMode::Default);
        assert_eq!(settings.serialization_mode(true).unwrap(), SerializationMode::Custom);
        let disabled = settings.with_sparse_serialization(false);
        assert!(disabled.serialization_mode(true).unwrap_err().is_protocol());
    }

    #[test]
    fn test_registry_round_trips_names() {
        let registry = TypeRegistry::default();
        for name in [
            "Int8",
            "UInt128",
            "Nullable(Float64)",
            "Array(Nullable(Decimal(18, 4)))",
            "Map(String, Array(UInt16))",
            "Tuple(a Int32, b String)",
            "DateTime('Asia/Tokyo')",
            "DateTime64(6)",
            "FixedString(16)",
            "Enum8('a' = 1, 'b' = 2)",
            "Variant(String, UInt64)",
        ] {
            let ty = registry.resolve(name).unwrap();
            assert_eq!(ty.type_name().to_string(), name);
        }
    }

    #[test]
    fn test_unknown_and_unsupported() {
        let registry = TypeRegistry::default();
        let err = registry.resolve("Int7").err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert!(err.to_string().contains("Int7"));

        let err = registry.resolve("LowCardinality(String)").err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::NotSupported { .. }));
    }
}
