use byteorder::{BE, ByteOrder, LE};
use kvsearch_common::{Result, error::Error};

/// A sequential reader over a borrowed byte buffer.
///
/// The cursor owns only its position; any number of cursors may view the same
/// buffer. It is `Copy`, and cursors produced by [`read_pointer`](Self::read_pointer)
/// or [`fork`](Self::fork) borrow the buffer itself rather than the parent
/// cursor, so the parent can keep reading while the derived cursor is alive.
///
/// Big-endian reads serve the structural fields of packed index blobs;
/// little-endian reads serve the query engine's memory layout.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> MemoryCursor<'a> {
    /// Creates a cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> MemoryCursor<'a> {
        MemoryCursor { buf, pos: 0 }
    }

    /// Creates a cursor at `pos`.
    ///
    /// The position itself is not validated until the first read.
    pub fn at(buf: &'a [u8], pos: usize) -> MemoryCursor<'a> {
        MemoryCursor { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Number of bytes between the current position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Moves this cursor to an absolute offset.
    pub fn jump_to(&mut self, pos: usize) -> &mut Self {
        self.pos = pos;
        self
    }

    /// Advances the position by `len` bytes without reading them.
    pub fn skip(&mut self, len: usize) -> Result<&mut Self> {
        self.take(len)?;
        Ok(self)
    }

    /// Returns an independent cursor at `pos`, leaving this one untouched.
    pub fn fork(&self, pos: usize) -> MemoryCursor<'a> {
        MemoryCursor { buf: self.buf, pos }
    }

    /// Reads a little-endian `u32` and returns a cursor positioned at that
    /// absolute offset over the same buffer.
    pub fn read_pointer(&mut self) -> Result<MemoryCursor<'a>> {
        let ptr = self.read_u32_le()?;
        Ok(self.fork(ptr as usize))
    }

    /// Reads `len` raw bytes.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    /// Reads a slice whose length is given by a leading `u8`.
    pub fn read_u8_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u8()? as usize;
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        self.take(4).map(LE::read_i32)
    }

    pub fn read_i32_be(&mut self) -> Result<i32> {
        self.take(4).map(BE::read_i32)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.take(4).map(LE::read_u32)
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.take(4).map(BE::read_u32)
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        self.take(8).map(LE::read_i64)
    }

    pub fn read_i64_be(&mut self) -> Result<i64> {
        self.take(8).map(BE::read_i64)
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.take(8).map(LE::read_u64)
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.take(8).map(BE::read_u64)
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        self.take(8).map(LE::read_f64)
    }

    /// Reads a UTF-8 string up to the next zero byte and advances past the
    /// terminator.
    pub fn read_c_str(&mut self) -> Result<&'a str> {
        let rest = self.buf.get(self.pos..).unwrap_or_default();
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            Error::truncated("null-terminated string", self.pos, rest.len() + 1, self.buf.len())
        })?;
        let bytes = &rest[..len];
        let s = std::str::from_utf8(bytes).map_err(|e| {
            kvsearch_common::ErrorKind::InvalidFormat {
                element: "null-terminated string".to_string(),
                message: e.to_string(),
            }
        })?;
        self.pos += len + 1;
        Ok(s)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::truncated("memory", self.pos, len, self.buf.len()))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}
