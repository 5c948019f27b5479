//! Types built from other types: `Nullable`, `Array`, `Tuple`, `Map` and `Variant`.
//!
//! Each composite reader is generic over the reader flavor, so that the same
//! descriptor serves both materializing and skipping reads.

use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::column::AnyColumn;
use crate::reader::array::ArrayColumnReader;
use crate::reader::nullable::NullableColumnReader;
use crate::reader::tuple::TupleColumnReader;
use crate::reader::variant::VariantColumnReader;
use crate::reader::{ChildReader, ColumnReader, SkippingColumnReader};
use crate::value::ValueKind;
use crate::writer::array::ArrayColumnWriter;
use crate::writer::nullable::NullableColumnWriter;
use crate::writer::tuple::TupleColumnWriter;
use crate::writer::variant::VariantColumnWriter;
use crate::writer::ColumnWriter;

use super::{ColumnType, TypeArg, TypeName, TypeSettings};

/// Applies `settings` to every type of `types`. Returns `None` when none of them
/// change.
fn configure_all(
    types: &[Arc<dyn ColumnType>],
    settings: &TypeSettings,
) -> Option<Vec<Arc<dyn ColumnType>>> {
    let configured: Vec<_> = types.iter().map(|ty| ty.configure(settings)).collect();
    if configured.iter().all(Option::is_none) {
        return None;
    }
    Some(
        types
            .iter()
            .zip(configured)
            .map(|(ty, configured)| configured.unwrap_or_else(|| ty.clone()))
            .collect(),
    )
}

fn shape_mismatch(ty: &dyn ColumnType, name: &str, column: &AnyColumn) -> Error {
    Error::not_supported(format!(
        "column '{name}' of type {} cannot be written from {} values",
        ty.type_name(),
        column.kind()
    ))
}

/// `Nullable(T)`: a null byte per row, then the `T` column with placeholder
/// values at the null rows.
#[derive(Debug, Clone)]
pub struct NullableType {
    inner: Arc<dyn ColumnType>,
}

impl NullableType {
    pub fn new(inner: Arc<dyn ColumnType>) -> Result<NullableType> {
        if !inner.value_kind().is_scalar() {
            return Err(Error::invalid_arg(
                "inner",
                format!("{} cannot be inside Nullable", inner.type_name()),
            ));
        }
        Ok(NullableType { inner })
    }

    pub fn inner(&self) -> &Arc<dyn ColumnType> {
        &self.inner
    }
}

impl ColumnType for NullableType {
    fn type_name(&self) -> TypeName {
        TypeName::with_args("Nullable", vec![TypeArg::Type(self.inner.type_name())])
    }

    fn value_kind(&self) -> ValueKind {
        self.inner.value_kind()
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        let inner = self.inner.configure(settings)?;
        Some(Arc::new(NullableType { inner }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        let values = self.inner.create_plain_reader(row_count)?;
        Ok(Box::new(NullableColumnReader::new(values)))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        let values = self.inner.create_plain_skipping_reader(row_count)?;
        Ok(Box::new(NullableColumnReader::new(values)))
    }

    fn sparse_values(&self) -> Option<(Arc<dyn ColumnType>, bool)> {
        self.inner.sparse_values().map(|(values, _)| (values, true))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let values = self.inner.create_column_writer(name, column)?;
        Ok(Box::new(NullableColumnWriter::new(column.clone(), values)))
    }
}

/// `Array(T)`.
#[derive(Debug, Clone)]
pub struct ArrayType {
    element: Arc<dyn ColumnType>,
}

impl ArrayType {
    pub fn new(element: Arc<dyn ColumnType>) -> ArrayType {
        ArrayType { element }
    }

    pub fn element(&self) -> &Arc<dyn ColumnType> {
        &self.element
    }
}

impl ColumnType for ArrayType {
    fn type_name(&self) -> TypeName {
        TypeName::with_args("Array", vec![TypeArg::Type(self.element.type_name())])
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Array(Box::new(self.element.value_kind()))
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        let element = self.element.configure(settings)?;
        Some(Arc::new(ArrayType { element }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(Box::new(ArrayColumnReader::<dyn ColumnReader>::new(
            self.element.clone(),
            row_count,
        )?))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(ArrayColumnReader::<dyn SkippingColumnReader>::new(
            self.element.clone(),
            row_count,
        )?))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let array = column
            .as_array()
            .ok_or_else(|| shape_mismatch(self, name, column))?;
        let elements = self.element.create_column_writer(name, array.elements())?;
        Ok(Box::new(ArrayColumnWriter::new(array, elements)?))
    }
}

/// `Tuple(T1, ..., Tn)`, optionally with element names.
#[derive(Debug, Clone)]
pub struct TupleType {
    elements: Vec<Arc<dyn ColumnType>>,
    names: Option<Vec<String>>,
}

impl TupleType {
    pub fn new(elements: Vec<Arc<dyn ColumnType>>) -> Result<TupleType> {
        if elements.is_empty() {
            return Err(Error::invalid_arg("elements", "a tuple needs at least one element"));
        }
        Ok(TupleType {
            elements,
            names: None,
        })
    }

    pub fn named(elements: Vec<(String, Arc<dyn ColumnType>)>) -> Result<TupleType> {
        let (names, elements): (Vec<_>, Vec<_>) = elements.into_iter().unzip();
        let mut tuple = TupleType::new(elements)?;
        tuple.names = Some(names);
        Ok(tuple)
    }

    pub fn elements(&self) -> &[Arc<dyn ColumnType>] {
        &self.elements
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    fn children<R: ChildReader + ?Sized>(&self, row_count: usize) -> Result<Vec<Box<R>>> {
        self.elements
            .iter()
            .map(|ty| R::create(&**ty, row_count))
            .collect()
    }

    fn element_label(&self, name: &str, index: usize) -> String {
        match &self.names {
            Some(names) => format!("{name}.{}", names[index]),
            None => format!("{name}.{}", index + 1),
        }
    }
}

impl ColumnType for TupleType {
    fn type_name(&self) -> TypeName {
        let args = match &self.names {
            Some(names) => names
                .iter()
                .zip(&self.elements)
                .map(|(name, ty)| TypeArg::Named(name.clone(), ty.type_name()))
                .collect(),
            None => self
                .elements
                .iter()
                .map(|ty| TypeArg::Type(ty.type_name()))
                .collect(),
        };
        TypeName::with_args("Tuple", args)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Tuple(self.elements.iter().map(|ty| ty.value_kind()).collect())
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        let elements = configure_all(&self.elements, settings)?;
        Some(Arc::new(TupleType {
            elements,
            names: self.names.clone(),
        }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        let children = self.children::<dyn ColumnReader>(row_count)?;
        Ok(Box::new(
            TupleColumnReader::new(children, row_count)?.with_names(self.names.clone()),
        ))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        let children = self.children::<dyn SkippingColumnReader>(row_count)?;
        Ok(Box::new(TupleColumnReader::new(children, row_count)?))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let tuple = column
            .as_tuple()
            .filter(|tuple| tuple.arity() == self.elements.len())
            .ok_or_else(|| shape_mismatch(self, name, column))?;
        let writers = self
            .elements
            .iter()
            .zip(tuple.children())
            .enumerate()
            .map(|(i, (ty, child))| ty.create_column_writer(&self.element_label(name, i), child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(TupleColumnWriter::new(writers)?))
    }
}

/// `Map(K, V)`, serialized as `Array(Tuple(K, V))`.
#[derive(Debug, Clone)]
pub struct MapType {
    key: Arc<dyn ColumnType>,
    value: Arc<dyn ColumnType>,
    entries: ArrayType,
}

impl MapType {
    pub fn new(key: Arc<dyn ColumnType>, value: Arc<dyn ColumnType>) -> Result<MapType> {
        let entry = TupleType::new(vec![key.clone(), value.clone()])?;
        Ok(MapType {
            key,
            value,
            entries: ArrayType::new(Arc::new(entry)),
        })
    }

    pub fn key(&self) -> &Arc<dyn ColumnType> {
        &self.key
    }

    pub fn value(&self) -> &Arc<dyn ColumnType> {
        &self.value
    }
}

impl ColumnType for MapType {
    fn type_name(&self) -> TypeName {
        TypeName::with_args(
            "Map",
            vec![
                TypeArg::Type(self.key.type_name()),
                TypeArg::Type(self.value.type_name()),
            ],
        )
    }

    fn value_kind(&self) -> ValueKind {
        self.entries.value_kind()
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        let types = configure_all(&[self.key.clone(), self.value.clone()], settings)?;
        let [key, value]: [Arc<dyn ColumnType>; 2] = types.try_into().ok()?;
        MapType::new(key, value)
            .ok()
            .map(|map| -> Arc<dyn ColumnType> { Arc::new(map) })
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        self.entries.create_plain_reader(row_count)
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        self.entries.create_plain_skipping_reader(row_count)
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        self.entries.create_column_writer(name, column)
    }
}

/// `Variant(T1, ..., Tn)`. Variants are kept sorted by type name, which is the
/// order the server assigns discriminators in.
#[derive(Debug, Clone)]
pub struct VariantType {
    variants: Vec<Arc<dyn ColumnType>>,
}

/// Tag `0xFF` marks null rows, so at most 255 variants have a discriminator.
pub const MAX_VARIANTS: usize = 255;

impl VariantType {
    pub fn new(mut variants: Vec<Arc<dyn ColumnType>>) -> Result<VariantType> {
        if variants.is_empty() || variants.len() > MAX_VARIANTS {
            return Err(Error::invalid_arg(
                "variants",
                format!("a variant needs 1 to {MAX_VARIANTS} types, got {}", variants.len()),
            ));
        }
        if let Some(nullable) = variants.iter().find(|ty| ty.type_name().name == "Nullable") {
            return Err(Error::invalid_arg(
                "variants",
                format!("{} cannot be a variant type", nullable.type_name()),
            ));
        }
        variants.sort_by_cached_key(|ty| ty.type_name().to_string());
        Ok(VariantType { variants })
    }

    /// The variant types in discriminator order.
    pub fn variants(&self) -> &[Arc<dyn ColumnType>] {
        &self.variants
    }

    /// The discriminator of the variant named `type_name`.
    pub fn discriminator(&self, type_name: &str) -> Option<u8> {
        self.variants
            .iter()
            .position(|ty| ty.type_name().to_string() == type_name)
            .and_then(|i| u8::try_from(i).ok())
    }
}

impl ColumnType for VariantType {
    fn type_name(&self) -> TypeName {
        let args = self
            .variants
            .iter()
            .map(|ty| TypeArg::Type(ty.type_name()))
            .collect();
        TypeName::with_args("Variant", args)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Variant(self.variants.iter().map(|ty| ty.value_kind()).collect())
    }

    fn boxed(&self) -> Arc<dyn ColumnType> {
        Arc::new(self.clone())
    }

    fn configure(&self, settings: &TypeSettings) -> Option<Arc<dyn ColumnType>> {
        let variants = configure_all(&self.variants, settings)?;
        Some(Arc::new(VariantType { variants }))
    }

    fn create_plain_reader(&self, row_count: usize) -> Result<Box<dyn ColumnReader>> {
        Ok(Box::new(VariantColumnReader::<dyn ColumnReader>::new(
            self.variants.clone(),
            row_count,
        )?))
    }

    fn create_plain_skipping_reader(
        &self,
        row_count: usize,
    ) -> Result<Box<dyn SkippingColumnReader>> {
        Ok(Box::new(VariantColumnReader::<dyn SkippingColumnReader>::new(
            self.variants.clone(),
            row_count,
        )?))
    }

    fn create_column_writer(
        &self,
        name: &str,
        column: &AnyColumn,
    ) -> Result<Box<dyn ColumnWriter>> {
        let variant = column
            .as_variant()
            .filter(|variant| variant.children().len() == self.variants.len())
            .ok_or_else(|| shape_mismatch(self, name, column))?;
        let writers = self
            .variants
            .iter()
            .zip(variant.children())
            .map(|(ty, child)| ty.create_column_writer(name, child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(VariantColumnWriter::new(name, variant, writers)?))
    }
}
