use chwire_common::{Result, error::Error};
use integer_encoding::VarInt;

use crate::reader::sparse::END_OF_GRANULE_FLAG;

/// Encodes the group stream of a single-granule sparse column with explicit
/// values at `offsets`. The explicit values column follows it on the wire.
pub fn encode_sparse_offsets(offsets: &[usize], row_count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut position = 0;
    for &offset in offsets {
        if offset < position || offset >= row_count {
            return Err(Error::invalid_arg(
                "offsets",
                format!(
                    "offset {offset} must be ascending and below {row_count}, next free row is {position}"
                ),
            ));
        }
        out.extend_from_slice(&((offset - position) as u64).encode_var_vec());
        position = offset + 1;
    }
    let closing = END_OF_GRANULE_FLAG | (row_count - position) as u64;
    out.extend_from_slice(&closing.encode_var_vec());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_stream() {
        let bytes = encode_sparse_offsets(&[2, 5, 9], 12).unwrap();
        assert_eq!(&bytes[..3], &[2, 2, 3]);
        let (closing, _) = u64::decode_var(&bytes[3..]).unwrap();
        assert_eq!(closing, END_OF_GRANULE_FLAG | 2);
        assert!(encode_sparse_offsets(&[3, 3], 5).is_err());
        assert!(encode_sparse_offsets(&[5], 5).is_err());
    }
}
