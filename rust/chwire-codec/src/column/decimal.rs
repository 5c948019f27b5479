use std::sync::Arc;

use chwire_common::Result;

use crate::decimal::{Decimal, MAX_SCALE};

use super::{AnyColumn, Column, row_out_of_range};

/// Raw two's-complement decimal storage: `i32`, `i64` or `i128` by precision.
pub trait DecimalRaw: Copy + Send + Sync + 'static + Into<i128> {}

impl DecimalRaw for i32 {}
impl DecimalRaw for i64 {}
impl DecimalRaw for i128 {}

/// Decimal values kept as raw wire integers with a shared scale. Conversion to
/// [`Decimal`] happens on access, where values that cannot be represented fail.
pub struct DecimalColumn<R> {
    raw: Arc<[R]>,
    scale: u32,
}

impl<R: DecimalRaw> DecimalColumn<R> {
    pub fn new(raw: impl Into<Arc<[R]>>, scale: u32) -> DecimalColumn<R> {
        DecimalColumn {
            raw: raw.into(),
            scale,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn raw(&self) -> &[R] {
        &self.raw
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::Decimal(Arc::new(self))
    }
}

impl<R: DecimalRaw> Column<Decimal> for DecimalColumn<R> {
    fn row_count(&self) -> usize {
        self.raw.len()
    }

    fn value(&self, index: usize) -> Result<Decimal> {
        let raw = self
            .raw
            .get(index)
            .ok_or_else(|| row_out_of_range(index, self.raw.len()))?;
        Decimal::new((*raw).into(), self.scale)
    }

    fn default_value(&self) -> Option<Decimal> {
        Decimal::new(0, self.scale.min(MAX_SCALE)).ok()
    }
}
