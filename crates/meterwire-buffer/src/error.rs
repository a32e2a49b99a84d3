/// Errors that can occur while reading or writing binary buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// A read, write or seek crossed the end of the buffer.
    #[error("out of range at offset {offset} (needed {needed} bytes, {available} available)")]
    OutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// An extended value ran past its maximum group count or overflowed 32 bits.
    #[error("malformed extended value at offset {offset}")]
    MalformedVarint { offset: usize },
}

pub type Result<T> = std::result::Result<T, BufferError>;
