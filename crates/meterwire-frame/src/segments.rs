//! Multi-segment payload reassembly.
//!
//! Payloads larger than one LoRa frame are split into numbered segments that
//! share a segmentation session id. Segment body layout:
//!
//! ```text
//! ┌────────────┬───────────────────────────────────────┬──────────┐
//! │ Session id │ Flags                                 │ Data     │
//! │ (1B)       │ bits 0-2 index, 4-6 count, 7 is-last  │ (rest)   │
//! └────────────┴───────────────────────────────────────┴──────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use bytes::{Bytes, BytesMut};
use meterwire_buffer::{BinaryCursor, Endian};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};

/// Largest segment index or count the 3-bit header fields can carry.
pub const MAX_SEGMENTS: u8 = 7;

const INDEX_MASK: u8 = 0x07;
const COUNT_SHIFT: u8 = 4;
const LAST_FLAG: u8 = 0x80;

/// One piece of a segmented payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataSegment {
    pub session_id: u8,
    /// 1-based position of this segment.
    pub segment_index: u8,
    pub segments_number: u8,
    pub is_last: bool,
    pub data: Bytes,
}

impl DataSegment {
    /// Parse a segment body.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut cursor = BinaryCursor::from_bytes(body, Endian::Little);
        let session_id = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        let data = Bytes::copy_from_slice(cursor.read_bytes(cursor.remaining())?);

        Ok(Self {
            session_id,
            segment_index: flags & INDEX_MASK,
            segments_number: (flags >> COUNT_SHIFT) & INDEX_MASK,
            is_last: flags & LAST_FLAG != 0,
            data,
        })
    }

    /// Serialize the segment body.
    pub fn encode(&self) -> Result<Bytes> {
        if self.segment_index > MAX_SEGMENTS || self.segments_number > MAX_SEGMENTS {
            return Err(FrameError::InvalidSegment(format!(
                "index {} of {} does not fit the header",
                self.segment_index, self.segments_number
            )));
        }

        let mut flags = self.segment_index | (self.segments_number << COUNT_SHIFT);
        if self.is_last {
            flags |= LAST_FLAG;
        }

        let mut cursor = BinaryCursor::with_len(2 + self.data.len(), Endian::Little);
        cursor.write_u8(self.session_id)?;
        cursor.write_u8(flags)?;
        cursor.write_bytes(&self.data)?;
        Ok(cursor.into_bytes())
    }
}

/// Split `payload` into segments of at most `max_chunk` bytes.
pub fn split_payload(session_id: u8, payload: &[u8], max_chunk: usize) -> Result<Vec<DataSegment>> {
    if max_chunk == 0 {
        return Err(FrameError::InvalidSegment(
            "segment size must be non-zero".into(),
        ));
    }

    let max_size = max_chunk.saturating_mul(usize::from(MAX_SEGMENTS));
    if payload.len() > max_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: max_size,
        });
    }

    let mut chunks: Vec<&[u8]> = payload.chunks(max_chunk).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    let segments_number = chunks.len() as u8;
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(position, chunk)| {
            let segment_index = position as u8 + 1;
            DataSegment {
                session_id,
                segment_index,
                segments_number,
                is_last: segment_index == segments_number,
                data: Bytes::copy_from_slice(chunk),
            }
        })
        .collect())
}

/// Controls how many sessions are reassembled at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentsConfig {
    /// Sessions tracked concurrently; the least recently touched one is
    /// evicted beyond this. Default: 1 (a new session drops the previous).
    pub max_sessions: usize,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self { max_sessions: 1 }
    }
}

#[derive(Debug)]
struct Session {
    segments_number: u8,
    received: BTreeMap<u8, Bytes>,
    saw_last: bool,
    touched: u64,
}

impl Session {
    fn new(segments_number: u8, touched: u64) -> Self {
        Self {
            segments_number,
            received: BTreeMap::new(),
            saw_last: false,
            touched,
        }
    }

    fn accept(&mut self, segment: &DataSegment) -> std::result::Result<(), &'static str> {
        let index = segment.segment_index;
        if segment.segments_number != self.segments_number {
            return Err("conflicting segment count");
        }
        if index == 0 || index > self.segments_number {
            return Err("segment index out of range");
        }
        if self.received.contains_key(&index) {
            return Err("duplicate segment index");
        }
        if segment.is_last && index != self.segments_number {
            return Err("last flag on non-final segment");
        }

        self.received.insert(index, segment.data.clone());
        self.saw_last |= segment.is_last;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.saw_last && self.received.len() == usize::from(self.segments_number)
    }

    fn assemble(self) -> Bytes {
        let len = self.received.values().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(len);
        for data in self.received.into_values() {
            out.extend_from_slice(&data);
        }
        out.freeze()
    }
}

/// Reassembles segmented payloads, one record per session id.
///
/// Any duplicate, out-of-range or conflicting segment discards the whole
/// session; the sender has to restart it.
#[derive(Debug)]
pub struct DataSegmentsCollector {
    sessions: HashMap<u8, Session>,
    clock: u64,
    config: SegmentsConfig,
}

impl DataSegmentsCollector {
    /// Create a collector that tracks a single session.
    pub fn new() -> Self {
        Self::with_config(SegmentsConfig::default())
    }

    /// Create a collector with explicit configuration.
    pub fn with_config(config: SegmentsConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            clock: 0,
            config,
        }
    }

    /// Record a segment; returns the full payload once its session completes.
    pub fn push(&mut self, segment: DataSegment) -> Option<Bytes> {
        self.clock += 1;
        let id = segment.session_id;

        if !self.sessions.contains_key(&id) {
            self.sessions
                .insert(id, Session::new(segment.segments_number, self.clock));
            self.evict_stale(id);
        }

        let session = self.sessions.get_mut(&id)?;
        if let Err(reason) = session.accept(&segment) {
            debug!(
                session = id,
                index = segment.segment_index,
                reason,
                "segment session invalidated"
            );
            self.sessions.remove(&id);
            return None;
        }
        session.touched = self.clock;
        trace!(
            session = id,
            index = segment.segment_index,
            of = segment.segments_number,
            "segment recorded"
        );

        if !session.is_complete() {
            return None;
        }

        let payload = self.sessions.remove(&id)?.assemble();
        trace!(
            session = id,
            len = payload.len(),
            "segment session assembled"
        );
        Some(payload)
    }

    fn evict_stale(&mut self, keep: u8) {
        let limit = self.config.max_sessions.max(1);
        while self.sessions.len() > limit {
            let oldest = self
                .sessions
                .iter()
                .filter(|(id, _)| **id != keep)
                .min_by_key(|(_, session)| session.touched)
                .map(|(id, _)| *id);

            match oldest {
                Some(id) => {
                    debug!(session = id, "evicting incomplete segment session");
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Number of sessions with segments still outstanding.
    pub fn pending_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every pending session.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Current collector configuration.
    pub fn config(&self) -> &SegmentsConfig {
        &self.config
    }
}

impl Default for DataSegmentsCollector {
    fn default() -> Self {
        Self::new()
    }
}
