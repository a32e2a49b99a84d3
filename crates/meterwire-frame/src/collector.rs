use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::stuffing::FLAG;

/// Streaming frame extractor.
///
/// Feed it byte chunks as they arrive; it returns every frame completed by
/// each chunk. Corrupted spans come back as invalid frames so a damaged
/// frame never stalls the ones after it.
#[derive(Debug)]
pub struct FrameCollector {
    buf: BytesMut,
    started: bool,
    overflowed: bool,
    config: FrameConfig,
}

impl FrameCollector {
    /// Create a collector with default configuration (CRC-16 trailer).
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a collector with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::new(),
            started: false,
            overflowed: false,
            config,
        }
    }

    /// Consume a chunk and return the frames it completed, in stream order.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if let Some(frame) = self.push_byte(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    fn push_byte(&mut self, byte: u8) -> Option<Frame> {
        if byte == FLAG {
            return self.close_span();
        }

        if !self.started || self.overflowed {
            return None;
        }

        if self.buf.len() >= self.config.max_frame_size {
            debug!(
                max = self.config.max_frame_size,
                "frame exceeds size limit, skipping to next flag"
            );
            self.overflowed = true;
            let raw = self.buf.split().freeze();
            return Some(Frame::invalid(raw, Default::default(), "frame too long"));
        }

        self.buf.put_u8(byte);
        None
    }

    fn close_span(&mut self) -> Option<Frame> {
        if !self.started {
            self.started = true;
            if !self.buf.is_empty() {
                debug!(len = self.buf.len(), "discarding bytes before first flag");
                self.buf.clear();
            }
            return None;
        }

        if self.overflowed {
            self.overflowed = false;
            return None;
        }

        if self.buf.is_empty() {
            return None;
        }

        let raw = self.buf.split().freeze();
        let frame = decode_frame(raw, self.config.check);
        match &frame.error {
            None => trace!(len = frame.content.len(), "frame collected"),
            Some(reason) => debug!(%reason, len = frame.raw.len(), "invalid frame collected"),
        }
        Some(frame)
    }

    /// Drop any partial frame and wait for a fresh opening flag.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.started = false;
        self.overflowed = false;
    }

    /// Number of bytes buffered for the frame in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Current collector configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for FrameCollector {
    fn default() -> Self {
        Self::new()
    }
}
