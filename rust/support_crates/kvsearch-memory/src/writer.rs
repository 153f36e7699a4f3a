use byteorder::{ByteOrder, LE};
use kvsearch_common::{Result, error::Error};

/// A sequential writer over a mutably borrowed byte buffer.
///
/// Only the two operations needed to lay out engine input are supported:
/// little-endian `u32` values and bulk copies.
#[derive(Debug)]
pub struct MemoryWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> MemoryWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> MemoryWriter<'a> {
        MemoryWriter { buf, pos: 0 }
    }

    pub fn at(buf: &'a mut [u8], pos: usize) -> MemoryWriter<'a> {
        MemoryWriter { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn write_u32_le(&mut self, value: u32) -> Result<&mut Self> {
        LE::write_u32(self.reserve(4)?, value);
        Ok(self)
    }

    pub fn write_all(&mut self, src: &[u8]) -> Result<&mut Self> {
        self.reserve(src.len())?.copy_from_slice(src);
        Ok(self)
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::truncated("memory", start, len, self.buf.len()))?;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryWriter;

    #[test]
    fn test_chained_writes() {
        let mut buf = [0u8; 10];
        MemoryWriter::new(&mut buf)
            .write_u32_le(0x0403_0201)
            .unwrap()
            .write_all(b"xyz")
            .unwrap();
        assert_eq!(&buf[..7], &[1, 2, 3, 4, b'x', b'y', b'z']);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut buf = [0u8; 6];
        let mut writer = MemoryWriter::at(&mut buf, 4);
        assert!(writer.write_u32_le(1).is_err());
        assert_eq!(writer.position(), 4);
        assert!(writer.write_all(&[9, 9]).is_ok());
        assert!(writer.write_all(&[]).is_ok());
        assert!(writer.write_all(&[1]).is_err());
        assert_eq!(buf, [0, 0, 0, 0, 9, 9]);
    }
}
