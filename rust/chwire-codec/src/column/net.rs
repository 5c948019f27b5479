use std::net::Ipv4Addr;
use std::sync::Arc;

use chwire_common::Result;

use crate::value::ValueKind;

use super::{AnyColumn, Column, PrimitiveColumn, row_out_of_range};

/// IPv4 addresses kept in their raw `u32` wire representation.
pub struct Ipv4Column {
    raw: Arc<[u32]>,
}

impl Ipv4Column {
    pub fn new(raw: impl Into<Arc<[u32]>>) -> Ipv4Column {
        Ipv4Column { raw: raw.into() }
    }

    pub fn into_any(self) -> AnyColumn {
        AnyColumn::Ipv4(Arc::new(self))
    }
}

impl Column<Ipv4Addr> for Ipv4Column {
    fn row_count(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    fn value(&self, index: usize) -> Result<Ipv4Addr> {
        self.raw
            .get(index)
            .map(|&raw| Ipv4Addr::from(raw))
            .ok_or_else(|| row_out_of_range(index, self.raw.len()))
    }

    fn default_value(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::UNSPECIFIED)
    }

    fn reinterpret(&self, target: &ValueKind) -> Option<AnyColumn> {
        match target {
            ValueKind::UInt32 => Some(PrimitiveColumn::new(self.raw.clone()).with_default(0).into_any()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_ipv4_views() {
        let column = Ipv4Column::new(vec![0x7f00_0001u32, 0xc0a8_0101]).into_any();
        let raw = column.try_reinterpret_as::<u32>().unwrap();
        assert_eq!(raw.as_slice(), Some(&[0x7f00_0001u32, 0xc0a8_0101][..]));

        let text = column.try_reinterpret_as::<String>().unwrap();
        assert_eq!(text.value(1).unwrap(), "192.168.1.1");

        let signed = column.try_reinterpret_as::<i32>().unwrap();
        assert_eq!(signed.value(1).unwrap(), 0xc0a8_0101u32 as i32);

        let addr = column.try_reinterpret_as::<IpAddr>().unwrap();
        assert_eq!(addr.value(0).unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
