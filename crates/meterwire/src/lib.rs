//! Binary codec primitives for metering and telemetry protocols.
//!
//! meterwire provides the shared layer under pulse-counter, MTX, OBIS observer
//! and LoRa command codecs: binary cursors, extended value varints,
//! checksums, byte-stuffed framing and segment reassembly.
//!
//! # Crate Structure
//!
//! - [`buffer`]: Binary cursor, extended values, CRC-16 and LRC
//! - [`frame`]: Byte stuffing, frame collection and segment reassembly
//!   (async codec behind the `async` feature)

/// Re-export buffer types.
pub mod buffer {
    pub use meterwire_buffer::*;
}

/// Re-export frame types.
pub mod frame {
    pub use meterwire_frame::*;
}
