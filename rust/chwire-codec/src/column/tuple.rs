use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::value::{ColumnValue, Value, ValueKind};

use super::{AnyColumn, Column, ColumnRef};

/// N equally long child columns combined positionally.
#[derive(Clone)]
pub struct TupleColumn {
    children: Arc<[AnyColumn]>,
    names: Option<Arc<[String]>>,
    row_count: usize,
}

impl TupleColumn {
    pub fn new(children: Vec<AnyColumn>) -> Result<TupleColumn> {
        let Some(first) = children.first() else {
            return Err(Error::invalid_arg("children", "a tuple needs at least one element"));
        };
        let row_count = first.row_count();
        if let Some(child) = children.iter().find(|c| c.row_count() != row_count) {
            return Err(Error::invalid_arg(
                "children",
                format!(
                    "tuple elements differ in length: {row_count} and {}",
                    child.row_count()
                ),
            ));
        }
        Ok(TupleColumn {
            children: children.into(),
            names: None,
            row_count,
        })
    }

    pub fn with_names(mut self, names: Vec<String>) -> Result<TupleColumn> {
        if names.len() != self.children.len() {
            return Err(Error::invalid_arg(
                "names",
                format!("{} names for {} elements", names.len(), self.children.len()),
            ));
        }
        self.names = Some(names.into());
        Ok(self)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[AnyColumn] {
        &self.children
    }

    pub fn child(&self, index: usize) -> &AnyColumn {
        &self.children[index]
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn child_by_name(&self, name: &str) -> Option<&AnyColumn> {
        let position = self.names.as_ref()?.iter().position(|n| n == name)?;
        self.children.get(position)
    }

    pub fn value(&self, row: usize) -> Result<Value> {
        self.children
            .iter()
            .map(|child| child.value(row))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple)
    }

    pub fn default_value(&self) -> Option<Value> {
        self.children
            .iter()
            .map(AnyColumn::default_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Tuple)
    }

    /// Reinterprets every element against the matching kind. Fails when the arity
    /// differs or any element declines.
    pub fn reinterpret_children(&self, kinds: &[ValueKind]) -> Option<TupleColumn> {
        if kinds.len() != self.children.len() {
            return None;
        }
        let children = self
            .children
            .iter()
            .zip(kinds)
            .map(|(child, kind)| child.try_reinterpret(kind))
            .collect::<Option<Vec<_>>>()?;
        Some(TupleColumn {
            children: children.into(),
            names: self.names.clone(),
            row_count: self.row_count,
        })
    }
}

macro_rules! typed_tuple {
    ($name:ident, $arity:literal; $($t:ident: $idx:tt),+) => {
        /// Typed view over a tuple column of matching arity.
        pub struct $name<$($t),+> {
            columns: ($(ColumnRef<$t>,)+),
            row_count: usize,
        }

        impl<$($t: ColumnValue),+> Column<($($t,)+)> for $name<$($t),+> {
            fn row_count(&self) -> usize {
                self.row_count
            }

            fn value(&self, index: usize) -> Result<($($t,)+)> {
                Ok(($(self.columns.$idx.value(index)?,)+))
            }

            fn default_value(&self) -> Option<($($t,)+)> {
                Some(($(self.columns.$idx.default_value()?,)+))
            }
        }

        impl<$($t: ColumnValue),+> ColumnValue for ($($t,)+) {
            fn into_value(self) -> Value {
                Value::Tuple(vec![$(self.$idx.into_value()),+])
            }

            fn from_any(column: &AnyColumn) -> Option<ColumnRef<Self>> {
                let AnyColumn::Tuple(tuple) = column else {
                    return None;
                };
                if tuple.arity() != $arity {
                    return None;
                }
                let columns = ($($t::from_any(tuple.child($idx))?,)+);
                let typed: ColumnRef<Self> = Arc::new($name {
                    columns,
                    row_count: tuple.row_count(),
                });
                Some(typed)
            }
        }
    };
}

typed_tuple!(Tuple1Column, 1; A: 0);
typed_tuple!(Tuple2Column, 2; A: 0, B: 1);
typed_tuple!(Tuple3Column, 3; A: 0, B: 1, C: 2);
typed_tuple!(Tuple4Column, 4; A: 0, B: 1, C: 2, D: 3);
