use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::value::Value;

use super::{AnyColumn, row_out_of_range};

/// Tag byte marking a row without a value.
pub const NULL_DISCRIMINATOR: u8 = 0xFF;

/// Tagged union over a fixed list of child columns.
///
/// Each row carries a tag selecting the child and an index into it. Rows tagged
/// [`NULL_DISCRIMINATOR`] are null and their index is never consulted.
#[derive(Clone)]
pub struct VariantColumn {
    tags: Arc<[u8]>,
    indices: Arc<[u32]>,
    children: Arc<[AnyColumn]>,
}

impl VariantColumn {
    /// Derives the per-row indices from the tags: the n-th row carrying tag `t`
    /// refers to row n of child `t`.
    pub fn new(tags: impl Into<Arc<[u8]>>, children: Vec<AnyColumn>) -> Result<VariantColumn> {
        let tags = tags.into();
        let mut counts = vec![0u32; children.len()];
        let mut indices = Vec::with_capacity(tags.len());
        for &tag in tags.iter() {
            if tag == NULL_DISCRIMINATOR {
                indices.push(0);
                continue;
            }
            let count = counts.get_mut(usize::from(tag)).ok_or_else(|| {
                Error::invalid_arg("tags", format!("tag {tag} selects no variant"))
            })?;
            indices.push(*count);
            *count += 1;
        }
        for (tag, (child, &count)) in children.iter().zip(&counts).enumerate() {
            if child.row_count() != count as usize {
                return Err(Error::invalid_arg(
                    "children",
                    format!(
                        "variant {tag} has {} rows, tags select {count}",
                        child.row_count()
                    ),
                ));
            }
        }
        Ok(VariantColumn {
            tags,
            indices: indices.into(),
            children: children.into(),
        })
    }

    /// Uses explicit indices. Indices of null rows are not validated.
    pub fn with_indices(
        tags: impl Into<Arc<[u8]>>,
        indices: impl Into<Arc<[u32]>>,
        children: Vec<AnyColumn>,
    ) -> Result<VariantColumn> {
        let tags = tags.into();
        let indices = indices.into();
        if tags.len() != indices.len() {
            return Err(Error::invalid_arg(
                "indices",
                format!("{} indices for {} tags", indices.len(), tags.len()),
            ));
        }
        for (&tag, &index) in tags.iter().zip(indices.iter()) {
            if tag == NULL_DISCRIMINATOR {
                continue;
            }
            let child = children.get(usize::from(tag)).ok_or_else(|| {
                Error::invalid_arg("tags", format!("tag {tag} selects no variant"))
            })?;
            if index as usize >= child.row_count() {
                return Err(Error::invalid_arg(
                    "indices",
                    format!("index {index} is out of range for variant {tag}"),
                ));
            }
        }
        Ok(VariantColumn {
            tags,
            indices,
            children: children.into(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.tags.len()
    }

    pub fn children(&self) -> &[AnyColumn] {
        &self.children
    }

    pub fn tags(&self) -> &[u8] {
        &self.tags
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The selected child and the row within it, or `None` for a null row.
    pub fn resolve(&self, row: usize) -> Result<Option<(u8, usize)>> {
        let tag = *self
            .tags
            .get(row)
            .ok_or_else(|| row_out_of_range(row, self.tags.len()))?;
        if tag == NULL_DISCRIMINATOR {
            return Ok(None);
        }
        Ok(Some((tag, self.indices[row] as usize)))
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self.resolve(row) {
            Ok(Some((tag, index))) => self.children[usize::from(tag)].is_null(index),
            _ => true,
        }
    }

    pub fn value(&self, row: usize) -> Result<Value> {
        match self.resolve(row)? {
            Some((tag, index)) => self.children[usize::from(tag)].value(index),
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::PrimitiveColumn;
    use crate::column::string::StringColumn;
    use crate::value::ValueKind;

    fn children() -> Vec<AnyColumn> {
        vec![
            PrimitiveColumn::new(vec![1u64, 2]).into_any(),
            StringColumn::from_strings(["x"]).into_any(),
        ]
    }

    #[test]
    fn test_variant_values() {
        let column = VariantColumn::new(vec![0u8, 0xFF, 1, 0], children()).unwrap();
        assert_eq!(column.indices(), &[0, 0, 0, 1]);
        assert_eq!(
            AnyColumn::Variant(column.clone()).values().unwrap(),
            vec![
                Value::UInt64(1),
                Value::Null,
                Value::String("x".into()),
                Value::UInt64(2)
            ]
        );
        assert!(column.is_null(1));
        assert!(!column.is_null(2));
    }

    #[test]
    fn test_null_tag_ignores_index() {
        let column =
            VariantColumn::with_indices(vec![0xFFu8, 1], vec![u32::MAX, 0], children()).unwrap();
        assert_eq!(column.value(0).unwrap(), Value::Null);
        assert_eq!(column.value(1).unwrap(), Value::String("x".into()));
    }

    #[test]
    fn test_variant_declines_reinterpretation() {
        let column =
            AnyColumn::Variant(VariantColumn::new(vec![1u8, 0, 0], children()).unwrap());
        assert_eq!(
            column.kind(),
            ValueKind::Variant(vec![ValueKind::UInt64, ValueKind::String])
        );
        assert!(column.try_reinterpret(&ValueKind::String).is_none());
        assert!(column.try_reinterpret(&column.kind()).is_none());
    }

    #[test]
    fn test_variant_count_mismatch() {
        assert!(VariantColumn::new(vec![0u8], children()).is_err());
        assert!(VariantColumn::new(vec![2u8], children()).is_err());
    }
}
