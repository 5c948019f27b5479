use std::sync::Arc;

use ahash::AHashMap;
use chwire_common::{Result, error::Error};

use crate::value::{ColumnValue, ScalarValue, ValueKind};

use super::{AnyColumn, Column, ColumnRef, map_column};

/// Immutable bidirectional mapping between enum codes and names.
#[derive(Debug, Clone, Default)]
pub struct EnumDictionary {
    by_key: AHashMap<i16, String>,
    by_name: AHashMap<String, i16>,
}

impl EnumDictionary {
    pub fn new<I, S>(members: I) -> Result<EnumDictionary>
    where
        I: IntoIterator<Item = (S, i16)>,
        S: Into<String>,
    {
        let mut dictionary = EnumDictionary::default();
        for (name, key) in members {
            let name = name.into();
            if dictionary.by_key.contains_key(&key) || dictionary.by_name.contains_key(&name) {
                return Err(Error::invalid_arg(
                    "members",
                    format!("duplicate enum member '{name}' = {key}"),
                ));
            }
            dictionary.by_key.insert(key, name.clone());
            dictionary.by_name.insert(name, key);
        }
        Ok(dictionary)
    }

    pub fn name(&self, key: i16) -> Option<&str> {
        self.by_key.get(&key).map(String::as_str)
    }

    pub fn key(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Members ordered by code.
    pub fn members(&self) -> Vec<(&str, i16)> {
        let mut members: Vec<_> = self
            .by_key
            .iter()
            .map(|(&key, name)| (name.as_str(), key))
            .collect();
        members.sort_by_key(|&(_, key)| key);
        members
    }

    pub fn min_key(&self) -> Option<i16> {
        self.by_key.keys().copied().min()
    }
}

/// Key type of `Enum8` and `Enum16` columns.
pub trait EnumKey: ScalarValue + Copy + Into<i16> {}

impl EnumKey for i8 {}
impl EnumKey for i16 {}

/// Enum codes resolved to names through a dictionary.
///
/// Reinterpretation to integer kinds exposes the codes themselves.
pub struct EnumColumn<K> {
    keys: ColumnRef<K>,
    dictionary: Arc<EnumDictionary>,
}

impl<K: EnumKey> EnumColumn<K> {
    pub fn new(keys: ColumnRef<K>, dictionary: Arc<EnumDictionary>) -> EnumColumn<K> {
        EnumColumn { keys, dictionary }
    }

    pub fn dictionary(&self) -> &EnumDictionary {
        &self.dictionary
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::String(Arc::new(self))
    }
}

impl<K: EnumKey> Column<String> for EnumColumn<K> {
    fn row_count(&self) -> usize {
        self.keys.row_count()
    }

    fn value(&self, index: usize) -> Result<String> {
        let key: i16 = self.keys.value(index)?.into();
        self.dictionary
            .name(key)
            .map(str::to_owned)
            .ok_or_else(|| Error::invalid_cast(format!("enum code {key} has no member name")))
    }

    fn is_null(&self, index: usize) -> bool {
        self.keys.is_null(index)
    }

    fn default_value(&self) -> Option<String> {
        let key = self.dictionary.min_key()?;
        self.dictionary.name(key).map(str::to_owned)
    }

    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        K::wrap(self.keys.clone()).try_reinterpret(target)
    }
}

/// Views enum codes as a native enum type. Conversion matches on the integer
/// code only; a code without a corresponding `E` fails on access.
pub fn enum_codes<E>(column: &AnyColumn) -> Option<ColumnRef<E>>
where
    E: ColumnValue + TryFrom<i16>,
{
    let codes = column.try_reinterpret_as::<i16>()?;
    Some(map_column(codes, |code: i16| {
        E::try_from(code).map_err(|_| {
            Error::invalid_cast(format!(
                "enum code {code} does not map to {}",
                std::any::type_name::<E>()
            ))
        })
    }))
}
