//! HDLC-style byte stuffing.
//!
//! Inside a frame, every reserved byte is replaced by [`ESCAPE`] followed by
//! its substitute, so the [`FLAG`] byte only ever appears as a delimiter.
//!
//! | Reserved | Stuffed     |
//! |----------|-------------|
//! | `0x7E`   | `0x7D 0x5E` |
//! | `0x7D`   | `0x7D 0x5D` |
//! | `0x11`   | `0x7D 0x31` |
//! | `0x13`   | `0x7D 0x33` |

use crate::error::{FrameError, Result};

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;

/// Escape marker preceding a stuffed byte.
pub const ESCAPE: u8 = 0x7D;

/// Reserved byte -> substitute written after [`ESCAPE`].
const STUFFING_TABLE: [(u8, u8); 4] = [(0x7E, 0x5E), (0x7D, 0x5D), (0x11, 0x31), (0x13, 0x33)];

fn substitute(byte: u8) -> Option<u8> {
    STUFFING_TABLE
        .iter()
        .find(|(reserved, _)| *reserved == byte)
        .map(|(_, stuffed)| *stuffed)
}

fn original(stuffed: u8) -> Option<u8> {
    STUFFING_TABLE
        .iter()
        .find(|(_, substitute)| *substitute == stuffed)
        .map(|(reserved, _)| *reserved)
}

/// Returns true if `byte` must be escaped inside frame content.
pub fn is_reserved(byte: u8) -> bool {
    substitute(byte).is_some()
}

/// Length of `bytes` after stuffing.
pub fn stuffed_len(bytes: &[u8]) -> usize {
    bytes.len() + bytes.iter().filter(|byte| is_reserved(**byte)).count()
}

/// Escape every reserved byte.
pub fn stuff(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stuffed_len(bytes));
    stuff_into(bytes, &mut out);
    out
}

pub(crate) fn stuff_into(bytes: &[u8], out: &mut Vec<u8>) {
    for &byte in bytes {
        match substitute(byte) {
            Some(stuffed) => {
                out.push(ESCAPE);
                out.push(stuffed);
            }
            None => out.push(byte),
        }
    }
}

/// Reverse [`stuff`].
///
/// Fails on an escape byte at the very end or an escape followed by a byte
/// that has no entry in the stuffing table.
pub fn unstuff(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();

    while let Some(byte) = iter.next() {
        if byte != ESCAPE {
            out.push(byte);
            continue;
        }
        let stuffed = iter.next().ok_or(FrameError::TrailingEscape)?;
        out.push(original(stuffed).ok_or(FrameError::InvalidEscape(stuffed))?);
    }

    Ok(out)
}
