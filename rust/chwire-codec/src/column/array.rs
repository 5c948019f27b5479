use std::sync::Arc;

use chwire_common::{Result, error::Error};

use crate::value::{ColumnValue, Value, ValueKind};

use super::{AnyColumn, Column, ColumnRef, row_out_of_range};

/// The half-open range `[offset, offset + length)` of element rows making up one
/// array row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayRange {
    pub offset: usize,
    pub length: usize,
}

impl ArrayRange {
    pub fn new(offset: usize, length: usize) -> ArrayRange {
        ArrayRange { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Arrays as ranges over a flat element column.
#[derive(Clone)]
pub struct ArrayColumn {
    elements: Arc<AnyColumn>,
    ranges: Arc<[ArrayRange]>,
}

impl ArrayColumn {
    pub fn new(elements: AnyColumn, ranges: impl Into<Arc<[ArrayRange]>>) -> Result<ArrayColumn> {
        let ranges = ranges.into();
        let element_count = elements.row_count();
        if let Some(range) = ranges.iter().find(|r| r.end() > element_count) {
            return Err(Error::invalid_arg(
                "ranges",
                format!(
                    "range {}..{} exceeds {element_count} elements",
                    range.offset,
                    range.end()
                ),
            ));
        }
        Ok(ArrayColumn {
            elements: Arc::new(elements),
            ranges,
        })
    }

    /// Builds the ranges from cumulative end offsets, the wire representation.
    pub fn from_end_offsets(elements: AnyColumn, ends: &[u64]) -> Result<ArrayColumn> {
        let mut start = 0usize;
        let mut ranges = Vec::with_capacity(ends.len());
        for &end in ends {
            let end = usize::try_from(end)
                .map_err(|_| Error::invalid_arg("ends", format!("offset {end} is too large")))?;
            if end < start {
                return Err(Error::invalid_arg(
                    "ends",
                    format!("offset {end} precedes {start}"),
                ));
            }
            ranges.push(ArrayRange::new(start, end - start));
            start = end;
        }
        ArrayColumn::new(elements, ranges)
    }

    pub fn row_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn elements(&self) -> &AnyColumn {
        &self.elements
    }

    pub fn ranges(&self) -> &[ArrayRange] {
        &self.ranges
    }

    pub fn range(&self, row: usize) -> Result<ArrayRange> {
        self.ranges
            .get(row)
            .copied()
            .ok_or_else(|| row_out_of_range(row, self.ranges.len()))
    }

    pub fn value(&self, row: usize) -> Result<Value> {
        let range = self.range(row)?;
        (range.offset..range.end())
            .map(|i| self.elements.value(i))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    /// Typed view with `Vec<T>` rows, if the elements can be viewed as `T`.
    pub fn typed<T: ColumnValue>(&self) -> Option<TypedArrayColumn<T>> {
        Some(TypedArrayColumn {
            elements: T::from_any(&self.elements)?,
            ranges: self.ranges.clone(),
        })
    }

    /// Reinterprets the elements, keeping the ranges.
    pub fn reinterpret_elements(&self, kind: &ValueKind) -> Option<ArrayColumn> {
        let elements = self.elements.try_reinterpret(kind)?;
        Some(ArrayColumn {
            elements: Arc::new(elements),
            ranges: self.ranges.clone(),
        })
    }
}

pub struct TypedArrayColumn<T> {
    elements: ColumnRef<T>,
    ranges: Arc<[ArrayRange]>,
}

impl<T: ColumnValue> TypedArrayColumn<T> {
    pub fn elements(&self) -> &ColumnRef<T> {
        &self.elements
    }

    pub fn len_at(&self, row: usize) -> Result<usize> {
        self.ranges
            .get(row)
            .map(|r| r.length)
            .ok_or_else(|| row_out_of_range(row, self.ranges.len()))
    }

    /// Copies the elements of `row` into the front of `dst` and returns their
    /// count. Elements stored contiguously are copied as one slice.
    pub fn copy_to(&self, row: usize, dst: &mut [T]) -> Result<usize> {
        let range = self
            .ranges
            .get(row)
            .copied()
            .ok_or_else(|| row_out_of_range(row, self.ranges.len()))?;
        if dst.len() < range.length {
            return Err(Error::invalid_arg(
                "dst",
                format!("{} slots for {} elements", dst.len(), range.length),
            ));
        }
        match self.elements.as_slice() {
            Some(slice) => dst[..range.length].clone_from_slice(&slice[range.offset..range.end()]),
            None => {
                for (slot, i) in dst.iter_mut().zip(range.offset..range.end()) {
                    *slot = self.elements.value(i)?;
                }
            }
        }
        Ok(range.length)
    }
}

impl<T: ColumnValue> Column<Vec<T>> for TypedArrayColumn<T> {
    fn row_count(&self) -> usize {
        self.ranges.len()
    }

    fn value(&self, index: usize) -> Result<Vec<T>> {
        let range = self
            .ranges
            .get(index)
            .copied()
            .ok_or_else(|| row_out_of_range(index, self.ranges.len()))?;
        (range.offset..range.end())
            .map(|i| self.elements.value(i))
            .collect()
    }

    fn default_value(&self) -> Option<Vec<T>> {
        Some(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{NullableColumn, PrimitiveColumn};

    fn sample() -> AnyColumn {
        let elements = PrimitiveColumn::new(vec![1i32, 2, 3, 4, 5]).into_any();
        let ranges = vec![
            ArrayRange::new(0, 2),
            ArrayRange::new(2, 0),
            ArrayRange::new(2, 3),
        ];
        AnyColumn::Array(ArrayColumn::new(elements, ranges).unwrap())
    }

    #[test]
    fn test_array_slicing() {
        let column = sample();
        let typed = column.try_reinterpret_as::<Vec<i32>>().unwrap();
        assert_eq!(typed.value(0).unwrap(), vec![1, 2]);
        assert_eq!(typed.value(1).unwrap(), Vec::<i32>::new());
        assert_eq!(typed.value(2).unwrap(), vec![3, 4, 5]);
        assert_eq!(
            column.value(0).unwrap(),
            Value::Array(vec![Value::Int32(1), Value::Int32(2)])
        );
    }

    #[test]
    fn test_copy_to() {
        let array = sample().as_array().unwrap().typed::<i32>().unwrap();
        let mut buf = [0i32; 4];
        assert_eq!(array.copy_to(2, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[3, 4, 5]);
        assert!(array.copy_to(2, &mut buf[..2]).is_err());

        // Widened elements have no backing slice and go through the row path.
        let widened = sample().as_array().unwrap().typed::<i64>().unwrap();
        let mut wide = [0i64; 3];
        assert_eq!(widened.copy_to(0, &mut wide).unwrap(), 2);
        assert_eq!(&wide[..2], &[1, 2]);
    }

    #[test]
    fn test_reinterpret_elements() {
        let column = sample();
        let widened = column
            .try_reinterpret(&ValueKind::Array(Box::new(ValueKind::Float64)))
            .unwrap();
        assert_eq!(widened.kind(), ValueKind::Array(Box::new(ValueKind::Float64)));
        assert!(column
            .try_reinterpret(&ValueKind::Array(Box::new(ValueKind::Uuid)))
            .is_none());
    }

    #[test]
    fn test_nullable_elements() {
        let elements = NullableColumn::from_options(vec![Some(1u8), None], 0).into_any();
        let column = AnyColumn::Array(ArrayColumn::from_end_offsets(elements, &[2]).unwrap());
        let typed = column.try_reinterpret_as::<Vec<Option<u8>>>().unwrap();
        assert_eq!(typed.value(0).unwrap(), vec![Some(1), None]);
    }

    #[test]
    fn test_invalid_ranges() {
        let elements = PrimitiveColumn::new(vec![1i32]).into_any();
        assert!(ArrayColumn::new(elements.clone(), vec![ArrayRange::new(0, 2)]).is_err());
        assert!(ArrayColumn::from_end_offsets(elements, &[1, 0]).is_err());
    }
}
