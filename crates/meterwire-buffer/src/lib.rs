//! Binary buffer primitives shared by every metering command codec.
//!
//! This is the lowest layer of meterwire:
//! - [`BinaryCursor`] for position-tracked fixed-width reads and writes
//! - [`extended`] for the 7-bit-group "extended value" integers
//! - [`checksum`] for the CRC-16 and LRC used by framing and block checks
//!
//! Command codecs decode a body by wrapping it in a cursor and reading
//! fields in order; any bounds violation surfaces as [`BufferError`].

pub mod checksum;
pub mod cursor;
pub mod error;
pub mod extended;

pub use checksum::{crc16, lrc, lrc_default, Crc16, LRC_INITIAL};
pub use cursor::{BinaryCursor, Endian, FixedWidth};
pub use error::{BufferError, Result};
pub use extended::{EMPTY_VALUE, MAX_GROUPS};
