use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, ensure_fits, Frame, FrameConfig};
use crate::collector::FrameCollector;
use crate::error::{FrameError, Result};

/// `tokio_util` codec over [`FrameCollector`], for `FramedRead`/`FramedWrite`.
///
/// Every decode call drains the read buffer into the collector; a partial
/// frame left at end of stream is dropped.
#[derive(Debug, Default)]
pub struct FrameCodec {
    collector: FrameCollector,
    ready: VecDeque<Frame>,
}

impl FrameCodec {
    /// Create a codec with default configuration (CRC-16 trailer).
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            collector: FrameCollector::with_config(config),
            ready: VecDeque::new(),
        }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        self.collector.config()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if self.ready.is_empty() && !src.is_empty() {
            let chunk = src.split();
            self.ready.extend(self.collector.process(&chunk));
        }
        Ok(self.ready.pop_front())
    }
}

impl<'a> Encoder<&'a [u8]> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &'a [u8], dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        let config = self.collector.config();
        encode_frame(payload, config.check, dst);
        ensure_fits(dst, start, config.max_frame_size)
    }
}
