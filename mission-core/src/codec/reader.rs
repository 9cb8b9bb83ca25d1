use zerocopy::{byteorder::little_endian, FromBytes};

use super::DecodeError;

/// A cursor over an inbound packet.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new [`Reader`].
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// The unread bytes.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Returns `true` if every byte has been read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads `n` bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.buf.len() - self.pos;
        if remaining < n {
            return Err(DecodeError::UnexpectedEnd {
                needed: n,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads the rest of the packet.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = self.remaining();
        self.pos = self.buf.len();
        bytes
    }

    /// Reads `n` bytes as a nested reader.
    pub fn sub(&mut self, n: usize) -> Result<Reader<'a>, DecodeError> {
        self.bytes(n).map(Reader::new)
    }

    /// Reads a single byte.
    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        self.bytes(1).map(|b| b[0])
    }

    /// Reads a single byte as a boolean.
    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        self.u8().map(|b| b != 0)
    }

    /// Reads a fixed-layout value.
    pub fn read<T: FromBytes>(&mut self) -> Result<T, DecodeError> {
        let bytes = self.bytes(size_of::<T>())?;
        T::read_from_bytes(bytes).map_err(|_| DecodeError::UnexpectedEnd {
            needed: size_of::<T>(),
            remaining: bytes.len(),
        })
    }

    /// Reads a little-endian `u16`.
    pub fn u16_le(&mut self) -> Result<u16, DecodeError> {
        self.read::<little_endian::U16>().map(|v| v.get())
    }

    /// Reads a little-endian `u32`.
    pub fn u32_le(&mut self) -> Result<u32, DecodeError> {
        self.read::<little_endian::U32>().map(|v| v.get())
    }

    /// Reads a little-endian `f32`.
    pub fn f32_le(&mut self) -> Result<f32, DecodeError> {
        self.read::<little_endian::F32>().map(|v| v.get())
    }

    /// Reads a little-endian `f64`.
    pub fn f64_le(&mut self) -> Result<f64, DecodeError> {
        self.read::<little_endian::F64>().map(|v| v.get())
    }

    /// Reads a string prefixed by its length in a single byte.
    pub fn text(&mut self) -> Result<String, DecodeError> {
        let len = self.u8()? as usize;
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidString)
    }
}
