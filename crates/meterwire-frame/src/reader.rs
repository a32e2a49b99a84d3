use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::codec::{Frame, FrameConfig};
use crate::collector::FrameCollector;
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads flag-delimited frames from any `Read` stream (serial port, socket, file).
///
/// Invalid frames are returned like valid ones; check [`Frame::is_valid`].
/// A frame cut short by end of stream is dropped.
pub struct FrameReader<T> {
    inner: T,
    collector: FrameCollector,
    ready: VecDeque<Frame>,
}

impl<T: Read> FrameReader<T> {
    /// Create a reader expecting CRC-16 frames.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            collector: FrameCollector::with_config(config),
            ready: VecDeque::new(),
        }
    }

    /// Block until the next frame is complete.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at end of stream.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while self.ready.is_empty() {
            let n = match self.inner.read(&mut chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            self.ready.extend(self.collector.process(&chunk[..n]));
        }
        self.ready.pop_front().ok_or(FrameError::ConnectionClosed)
    }

    /// Bytes of the frame currently being collected.
    pub fn pending(&self) -> usize {
        self.collector.pending()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        self.collector.config()
    }
}
