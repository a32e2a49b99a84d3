//! Frame and block checksums.
//!
//! The CRC is the byte-wise shift/XOR routine the meters implement in
//! firmware. Its bit operations must be kept exactly as written: any
//! table-driven replacement has to produce identical output for every input.

/// Default seed for [`lrc`].
pub const LRC_INITIAL: u8 = 0x55;

const CRC_INITIAL: u16 = 0xFFFF;

/// Incremental CRC-16 over one or more byte slices.
#[derive(Debug, Clone, Copy)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self { crc: CRC_INITIAL }
    }

    /// Feed more bytes into the accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let mut data = u16::from(byte ^ (self.crc & 0xFF) as u8);
            data ^= (data << 4) & 0xFF;
            self.crc = ((data << 8) | (self.crc >> 8)) ^ (data >> 4) ^ (data << 3);
        }
    }

    /// Final value with both bytes complemented.
    pub fn finish(&self) -> u16 {
        ((self.crc & 0xFF00) ^ 0xFF00) | ((self.crc & 0x00FF) ^ 0x00FF)
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-16 of `bytes`.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(bytes);
    crc.finish()
}

/// Longitudinal redundancy check: `initial` XOR every byte.
pub fn lrc(bytes: &[u8], initial: u8) -> u8 {
    bytes.iter().fold(initial, |acc, byte| acc ^ byte)
}

/// [`lrc`] seeded with [`LRC_INITIAL`].
pub fn lrc_default(bytes: &[u8]) -> u8 {
    lrc(bytes, LRC_INITIAL)
}
