//! Byte-stuffed, checksummed framing for metering links.
//!
//! Every frame on a serial or LoRa link looks like:
//! - a `0x7E` flag byte
//! - content with reserved bytes escaped behind `0x7D`
//! - a CRC-16 (2 bytes LE) or LRC (1 byte) trailer, also escaped
//! - a closing `0x7E` flag
//!
//! [`FrameCollector`] turns an arbitrary byte stream back into frames and
//! [`DataSegmentsCollector`] stitches segmented payloads back together.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod collector;
pub mod error;
pub mod reader;
pub mod segments;
pub mod stuffing;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{
    decode_frame, encode_frame, to_frame, Checksum, ChecksumPair, Frame, FrameCheck, FrameConfig,
    DEFAULT_MAX_FRAME_SIZE,
};
pub use collector::FrameCollector;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use segments::{
    split_payload, DataSegment, DataSegmentsCollector, SegmentsConfig, MAX_SEGMENTS,
};
pub use stuffing::{stuff, unstuff, ESCAPE, FLAG};
pub use writer::FrameWriter;
