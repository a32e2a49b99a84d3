use meterwire_buffer::BufferError;

/// Errors that can occur during framing, unstuffing and segment handling.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A buffer read or write failed.
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Stuffed content ended right after an escape byte.
    #[error("trailing incomplete escape")]
    TrailingEscape,

    /// An escape byte was followed by a byte with no unstuffed form.
    #[error("invalid escape sequence 0x7d 0x{0:02x}")]
    InvalidEscape(u8),

    /// A data segment header is inconsistent.
    #[error("invalid data segment: {0}")]
    InvalidSegment(String),

    /// The payload does not fit the configured limit.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
