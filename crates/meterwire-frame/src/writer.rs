use std::io::{self, ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, ensure_fits, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes checksummed, byte-stuffed frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

impl<T: Write> FrameWriter<T> {
    /// Create a writer emitting CRC-16 frames.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Frame `payload` and write it out (blocking).
    ///
    /// Nothing is written when the stuffed frame exceeds
    /// [`FrameConfig::max_frame_size`].
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, self.config.check, &mut self.buf);
        ensure_fits(&mut self.buf, 0, self.config.max_frame_size)?;

        let mut unsent = &self.buf[..];
        while !unsent.is_empty() {
            match self.inner.write(unsent) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => unsent = &unsent[n..],
                Err(err) if is_transient(&err) => {}
                Err(err) => return Err(err.into()),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream, retrying transient failures.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if is_transient(&err) => {}
                done => return done.map_err(FrameError::from),
            }
        }
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
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;
    use crate::codec::FrameCheck;
    use crate::collector::FrameCollector;
    use crate::stuffing::FLAG;

    fn lrc_config() -> FrameConfig {
        FrameConfig {
            check: FrameCheck::lrc(),
            ..FrameConfig::default()
        }
    }

    #[test]
    fn crc_frames_decode_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(b"one").unwrap();
        writer.send(&[0x7E, 0x13]).unwrap();

        let wire = writer.into_inner().into_inner();
        let frames = FrameCollector::new().process(&wire);
        assert!(frames.iter().all(|f| f.is_valid()));
        let contents: Vec<&[u8]> = frames.iter().map(|f| f.content.as_ref()).collect();
        assert_eq!(contents, vec![&b"one"[..], &[0x7E, 0x13][..]]);
    }

    #[test]
    fn lrc_frame_bytes() {
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), lrc_config());
        writer.send(&[0x09, 0x17, 0x06, 0x23]).unwrap();

        assert_eq!(writer.config().check, FrameCheck::lrc());
        assert_eq!(
            writer.into_inner().into_inner(),
            vec![FLAG, 0x09, 0x17, 0x06, 0x23, 0x6E, FLAG]
        );
    }

    #[test]
    fn oversized_frame_writes_nothing() {
        let cfg = FrameConfig {
            max_frame_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 11, max: 4 }));
        assert!(writer.get_ref().get_ref().is_empty());

        writer.send(b"ok").unwrap();
        assert_eq!(writer.get_ref().get_ref().len(), 6);
    }

    #[test]
    fn short_and_transient_writes_are_completed() {
        let link = ScriptedLink::new([
            Step::Fail(ErrorKind::Interrupted),
            Step::Accept(2),
            Step::Fail(ErrorKind::WouldBlock),
            Step::Accept(usize::MAX),
        ]);
        let mut writer = FrameWriter::with_config(link, lrc_config());
        writer.send(&[0x09, 0x17, 0x06, 0x23]).unwrap();

        let link = writer.into_inner();
        assert_eq!(link.data, vec![FLAG, 0x09, 0x17, 0x06, 0x23, 0x6E, FLAG]);
        assert_eq!(link.flushes, 1);
    }

    #[test]
    fn zero_length_write_means_closed() {
        let link = ScriptedLink::new([Step::Accept(0)]);
        let mut writer = FrameWriter::new(link);
        assert!(matches!(
            writer.send(b"x").unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn hard_write_error_propagates() {
        let link = ScriptedLink::new([Step::Fail(ErrorKind::BrokenPipe)]);
        let mut writer = FrameWriter::new(link);
        assert!(matches!(
            writer.send(b"x").unwrap_err(),
            FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe
        ));
    }

    enum Step {
        Accept(usize),
        Fail(ErrorKind),
    }

    /// Plays back a fixed sequence of write outcomes, then accepts everything.
    struct ScriptedLink {
        steps: VecDeque<Step>,
        data: Vec<u8>,
        flushes: usize,
    }

    impl ScriptedLink {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                data: Vec::new(),
                flushes: 0,
            }
        }
    }

    impl Write for ScriptedLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = match self.steps.pop_front() {
                Some(Step::Fail(kind)) => return Err(io::Error::from(kind)),
                Some(Step::Accept(limit)) => limit.min(buf.len()),
                None => buf.len(),
            };
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }
}
