use bytes::Bytes;

use crate::error::{BufferError, Result};

/// Byte order used for multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Least-significant byte first. Used by most command bodies.
    #[default]
    Little,
    /// Most-significant byte first.
    Big,
}

/// A fixed-width integer that can be transferred through a [`BinaryCursor`].
pub trait FixedWidth: Sized + Copy {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` bytes.
    fn decode(src: &[u8], endian: Endian) -> Self;

    /// Encode into exactly `WIDTH` bytes.
    fn encode(self, dst: &mut [u8], endian: Endian);
}

macro_rules! impl_fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn decode(src: &[u8], endian: Endian) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    match endian {
                        Endian::Little => <$ty>::from_le_bytes(raw),
                        Endian::Big => <$ty>::from_be_bytes(raw),
                    }
                }

                fn encode(self, dst: &mut [u8], endian: Endian) {
                    let raw = match endian {
                        Endian::Little => self.to_le_bytes(),
                        Endian::Big => self.to_be_bytes(),
                    };
                    dst.copy_from_slice(&raw);
                }
            }
        )*
    };
}

impl_fixed_width!(u8, i8, u16, i16, u32, i32);

/// Position-tracked byte buffer for decoding and encoding command bodies.
///
/// Every read or write advances the offset by the exact width transferred.
/// An operation that would cross the end of a fixed-size cursor fails with
/// [`BufferError::OutOfRange`] and leaves the offset where it was. A growable
/// cursor extends its storage on writes instead.
#[derive(Debug, Clone)]
pub struct BinaryCursor {
    data: Vec<u8>,
    offset: usize,
    endian: Endian,
    growable: bool,
}

impl BinaryCursor {
    /// Create a zero-filled cursor of fixed length, ready for writing.
    pub fn with_len(len: usize, endian: Endian) -> Self {
        Self {
            data: vec![0u8; len],
            offset: 0,
            endian,
            growable: false,
        }
    }

    /// Create an empty cursor whose storage grows as it is written.
    pub fn growable(endian: Endian) -> Self {
        Self {
            data: Vec::new(),
            offset: 0,
            endian,
            growable: true,
        }
    }

    /// Wrap existing bytes for reading (fixed length).
    pub fn from_bytes(data: impl Into<Vec<u8>>, endian: Endian) -> Self {
        Self {
            data: data.into(),
            offset: 0,
            endian,
            growable: false,
        }
    }

    /// Read one fixed-width value.
    pub fn read<T: FixedWidth>(&mut self) -> Result<T> {
        let endian = self.endian;
        let src = self.take(T::WIDTH)?;
        Ok(T::decode(src, endian))
    }

    /// Write one fixed-width value.
    pub fn write<T: FixedWidth>(&mut self, value: T) -> Result<()> {
        let endian = self.endian;
        let dst = self.take_mut(T::WIDTH)?;
        value.encode(dst, endian);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read()
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write(value)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write(value)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write(value)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write(value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write(value)
    }

    /// Read a byte flag; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Write a byte flag as `0x01` or `0x00`.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.take_mut(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or_else(|| self.out_of_range(1))
    }

    /// Move the cursor to an absolute offset (`0..=len`).
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(BufferError::OutOfRange {
                offset,
                needed: offset,
                available: self.data.len(),
            });
        }
        self.offset = offset;
        Ok(())
    }

    /// Bytes between the offset and the end of storage.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// True when nothing is left to read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying storage.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Byte order used for multi-byte fields.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// The whole underlying storage, regardless of the offset.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the cursor and return its storage.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.remaining() {
            return Err(self.out_of_range(len));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.data[start..self.offset])
    }

    fn take_mut(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.remaining() {
            if !self.growable {
                return Err(self.out_of_range(len));
            }
            self.data.resize(self.offset + len, 0);
        }
        let start = self.offset;
        self.offset += len;
        Ok(&mut self.data[start..self.offset])
    }

    fn out_of_range(&self, needed: usize) -> BufferError {
        BufferError::OutOfRange {
            offset: self.offset,
            needed,
            available: self.remaining(),
        }
    }
}
