//! Extended value encoding.
//!
//! Unsigned integers are written as 7-bit groups, least-significant group
//! first. Every byte except the last carries the continuation bit `0x80`.
//! Pulse counter values and day/hour diffs use this encoding.
//!
//! ```text
//! 300 = 0b10_0101100  ->  0xAC 0x02
//! ```

use tracing::debug;

use crate::cursor::BinaryCursor;
use crate::error::{BufferError, Result};

/// Archive slot sentinel meaning "no data".
pub const EMPTY_VALUE: u32 = 0xFFFF_FFFF;

/// Maximum number of groups in a 32-bit extended value.
pub const MAX_GROUPS: usize = 5;

const CONTINUATION_BIT: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;
const GROUP_BITS: u32 = 7;

/// Decode one extended value from the cursor.
///
/// Returns the value and the number of bytes consumed. On failure the
/// cursor is left where it was.
pub fn decode(cursor: &mut BinaryCursor) -> Result<(u32, usize)> {
    let start = cursor.position();
    let decoded = decode_groups(cursor, start);
    if let Err(err) = &decoded {
        debug!(offset = start, %err, "extended value rejected");
        cursor.seek(start)?;
    }
    decoded
}

fn decode_groups(cursor: &mut BinaryCursor, start: usize) -> Result<(u32, usize)> {
    let mut value: u64 = 0;

    for group in 0..MAX_GROUPS {
        let byte = cursor.read_u8()?;
        value |= u64::from(byte & GROUP_MASK) << (GROUP_BITS * group as u32);

        if byte & CONTINUATION_BIT == 0 {
            let value =
                u32::try_from(value).map_err(|_| BufferError::MalformedVarint { offset: start })?;
            return Ok((value, group + 1));
        }
    }

    Err(BufferError::MalformedVarint { offset: start })
}

/// Encode a value into its extended byte form.
pub fn encode(value: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(value));
    let mut rest = value;

    loop {
        bytes.push(CONTINUATION_BIT | (rest as u8 & GROUP_MASK));
        rest >>= GROUP_BITS;
        if rest == 0 {
            break;
        }
    }

    if let Some(last) = bytes.last_mut() {
        *last &= GROUP_MASK;
    }

    bytes
}

/// Number of bytes [`encode`] produces for `value`.
pub fn encoded_len(value: u32) -> usize {
    let bits = (u32::BITS - value.leading_zeros()).max(1) as usize;
    bits.div_ceil(GROUP_BITS as usize)
}

/// Encode `value` at the cursor.
pub fn write(cursor: &mut BinaryCursor, value: u32) -> Result<usize> {
    let bytes = encode(value);
    cursor.write_bytes(&bytes)?;
    Ok(bytes.len())
}

/// Decode an archive slot, mapping [`EMPTY_VALUE`] to `None`.
pub fn read_optional(cursor: &mut BinaryCursor) -> Result<Option<u32>> {
    let (value, _) = decode(cursor)?;
    Ok((value != EMPTY_VALUE).then_some(value))
}

/// Encode an archive slot, writing [`EMPTY_VALUE`] for `None`.
pub fn write_optional(cursor: &mut BinaryCursor, value: Option<u32>) -> Result<usize> {
    write(cursor, value.unwrap_or(EMPTY_VALUE))
}

impl BinaryCursor {
    /// Read an extended value, discarding its encoded length.
    pub fn read_extended_value(&mut self) -> Result<u32> {
        decode(self).map(|(value, _)| value)
    }

    /// Write an extended value.
    pub fn write_extended_value(&mut self, value: u32) -> Result<()> {
        write(self, value).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Endian;

    const SAMPLES: [u32; 7] = [0, 1, 127, 128, 16383, 16384, EMPTY_VALUE];

    fn decode_all(bytes: &[u8]) -> Result<(u32, usize)> {
        decode(&mut BinaryCursor::from_bytes(
            bytes.to_vec(),
            Endian::Little,
        ))
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        assert_eq!(encode(16383), vec![0xFF, 0x7F]);
        assert_eq!(encode(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode(EMPTY_VALUE), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn samples_survive_encode_decode() {
        for value in SAMPLES {
            let bytes = encode(value);
            assert_eq!(decode_all(&bytes).unwrap(), (value, bytes.len()), "{value}");
            assert_eq!(encoded_len(value), bytes.len(), "{value}");
        }
    }

    #[test]
    fn nonzero_values_never_emit_zero_bytes() {
        for value in SAMPLES.into_iter().filter(|v| *v > 0) {
            assert!(!encode(value).contains(&0x00), "{value}");
        }
    }

    #[test]
    fn decode_stops_at_first_terminal_byte() {
        let mut cursor = BinaryCursor::from_bytes(vec![0x80, 0x01, 0x05], Endian::Little);
        assert_eq!(decode(&mut cursor).unwrap(), (128, 2));
        assert_eq!(cursor.read_u8().unwrap(), 0x05);
    }

    #[test]
    fn too_many_groups_is_malformed() {
        let err = decode_all(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).unwrap_err();
        assert_eq!(err, BufferError::MalformedVarint { offset: 0 });
    }

    #[test]
    fn value_above_u32_is_malformed() {
        assert!(matches!(
            decode_all(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]),
            Err(BufferError::MalformedVarint { .. })
        ));
    }

    #[test]
    fn truncated_value_is_out_of_range() {
        assert!(matches!(
            decode_all(&[0x80, 0x80]),
            Err(BufferError::OutOfRange { .. })
        ));
    }

    #[test]
    fn failed_decode_leaves_cursor_in_place() {
        let mut cursor = BinaryCursor::from_bytes(vec![0x01, 0x80, 0x80], Endian::Little);
        assert_eq!(decode(&mut cursor).unwrap(), (1, 1));
        assert!(decode(&mut cursor).is_err());
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn optional_slots_use_sentinel() {
        let mut cursor = BinaryCursor::growable(Endian::Little);
        write_optional(&mut cursor, None).unwrap();
        write_optional(&mut cursor, Some(42)).unwrap();
        cursor.write_extended_value(7).unwrap();
        cursor.seek(0).unwrap();

        assert_eq!(read_optional(&mut cursor).unwrap(), None);
        assert_eq!(read_optional(&mut cursor).unwrap(), Some(42));
        assert_eq!(cursor.read_extended_value().unwrap(), 7);
        assert!(cursor.is_empty());
    }
}
