use bytes::{BufMut, Bytes, BytesMut};
use meterwire_buffer::{checksum, LRC_INITIAL};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::stuffing::{self, FLAG};

/// Default limit on the stuffed span between two flags: 4 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024;

/// Which checksum trails the frame content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameCheck {
    /// 2-byte little-endian CRC-16.
    #[default]
    Crc16,
    /// 1-byte XOR LRC with the given seed.
    Lrc { initial: u8 },
}

impl FrameCheck {
    /// LRC check with the protocol's default seed.
    pub const fn lrc() -> Self {
        Self::Lrc {
            initial: LRC_INITIAL,
        }
    }

    /// Number of trailing checksum bytes.
    pub fn trailer_len(&self) -> usize {
        match self {
            Self::Crc16 => 2,
            Self::Lrc { .. } => 1,
        }
    }

    /// Compute the checksum of `content`.
    pub fn compute(&self, content: &[u8]) -> Checksum {
        match self {
            Self::Crc16 => Checksum::Crc16(checksum::crc16(content)),
            Self::Lrc { initial } => Checksum::Lrc(checksum::lrc(content, *initial)),
        }
    }

    /// Interpret a trailer of exactly [`trailer_len`](Self::trailer_len) bytes.
    fn parse_trailer(&self, trailer: &[u8]) -> Checksum {
        match self {
            Self::Crc16 => Checksum::Crc16(u16::from_le_bytes([trailer[0], trailer[1]])),
            Self::Lrc { .. } => Checksum::Lrc(trailer[0]),
        }
    }
}

/// A checksum value as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Checksum {
    Crc16(u16),
    Lrc(u8),
}

impl Checksum {
    /// Short name used in mismatch reasons.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crc16(_) => "CRC16",
            Self::Lrc(_) => "LRC",
        }
    }

    fn put(&self, dst: &mut Vec<u8>) {
        match self {
            Self::Crc16(crc) => dst.extend_from_slice(&crc.to_le_bytes()),
            Self::Lrc(lrc) => dst.push(*lrc),
        }
    }
}

/// Checksum computed over the content next to the one received in the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChecksumPair {
    pub expected: Checksum,
    pub actual: Checksum,
}

/// A frame extracted from the stream.
///
/// Frames that fail validation are still produced, with
/// [`error`](Self::error) describing the problem, so callers can log them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Stuffed bytes seen between the two flags.
    pub raw: Bytes,
    /// Unstuffed content without the checksum trailer.
    pub content: Bytes,
    /// Present whenever the trailer could be located.
    pub checksum: Option<ChecksumPair>,
    /// Why the frame is invalid, if it is.
    pub error: Option<String>,
}

impl Frame {
    pub(crate) fn invalid(raw: Bytes, content: Bytes, reason: impl Into<String>) -> Self {
        Self {
            raw,
            content,
            checksum: None,
            error: Some(reason.into()),
        }
    }

    /// True when the trailer matched the content.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Total wire size, flags included.
    pub fn wire_size(&self) -> usize {
        self.raw.len() + 2
    }
}

/// Encode `payload` into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬────────────────────────────────────┬──────┐
/// │ 0x7E │ stuffed(payload ++ checksum)       │ 0x7E │
/// │      │ CRC-16 (2B LE) or LRC (1B)         │      │
/// └──────┴────────────────────────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], check: FrameCheck, dst: &mut BytesMut) {
    let mut body = Vec::with_capacity(payload.len() + check.trailer_len());
    body.extend_from_slice(payload);
    check.compute(payload).put(&mut body);

    let mut stuffed = Vec::with_capacity(stuffing::stuffed_len(&body));
    stuffing::stuff_into(&body, &mut stuffed);

    dst.reserve(stuffed.len() + 2);
    dst.put_u8(FLAG);
    dst.put_slice(&stuffed);
    dst.put_u8(FLAG);
}

/// Check that the frame just encoded at the end of `dst`, `start..`, fits
/// `max_frame_size` once its flags are excluded. Truncates it if it does not.
pub(crate) fn ensure_fits(dst: &mut BytesMut, start: usize, max_frame_size: usize) -> Result<()> {
    let span = dst.len() - start - 2;
    if span > max_frame_size {
        dst.truncate(start);
        return Err(FrameError::PayloadTooLarge {
            size: span,
            max: max_frame_size,
        });
    }
    Ok(())
}

/// Encode `payload` into a standalone frame buffer.
pub fn to_frame(payload: &[u8], check: FrameCheck) -> Bytes {
    let mut dst = BytesMut::new();
    encode_frame(payload, check, &mut dst);
    dst.freeze()
}

/// Validate the stuffed span found between two flags.
///
/// Never fails: malformed escapes, spans shorter than the trailer and
/// checksum mismatches all yield an invalid [`Frame`].
pub fn decode_frame(raw: Bytes, check: FrameCheck) -> Frame {
    let unstuffed = match stuffing::unstuff(&raw) {
        Ok(bytes) => bytes,
        Err(err) => return Frame::invalid(raw, Bytes::new(), err.to_string()),
    };

    let trailer_len = check.trailer_len();
    if unstuffed.len() < trailer_len {
        return Frame::invalid(raw, Bytes::from(unstuffed), "frame too short");
    }

    let split = unstuffed.len() - trailer_len;
    let expected = check.compute(&unstuffed[..split]);
    let actual = check.parse_trailer(&unstuffed[split..]);

    let mut content = Bytes::from(unstuffed);
    content.truncate(split);

    let error = (expected != actual).then(|| format!("mismatch {}", expected.name()));
    Frame {
        raw,
        content,
        checksum: Some(ChecksumPair { expected, actual }),
        error,
    }
}

/// Configuration for frame collection and stream adapters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameConfig {
    /// Trailer checksum. Default: CRC-16.
    pub check: FrameCheck,
    /// Maximum stuffed span between flags. Default: 4 KiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            check: FrameCheck::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
