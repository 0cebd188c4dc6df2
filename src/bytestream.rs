//! A thin sequential byte reader with a two byte pushback buffer.
//!
//! JPEG decoding is forward-only except for two places that need to unread
//! what they just looked at: the segment parser returns the start-of-scan
//! marker to the scan stage, and the bit stream returns a non-stuffed
//! `FF xx` pair when it runs into the marker that ends the entropy coded
//! data. Two bytes of pushback cover both, so any `BufRead` source works.

use std::io::BufRead;

use crate::errors::DecodeErrors;
use crate::misc::compose_be_u16;

/// A sequential byte source over any buffered reader.
pub struct ByteReader<R> {
    inner: R,
    /// LIFO pushback storage, `pushed` slots in use
    pushback: [u8; 2],
    pushed: usize,
}

impl<R> ByteReader<R>
where
    R: BufRead,
{
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> ByteReader<R> {
        ByteReader {
            inner,
            pushback: [0; 2],
            pushed: 0,
        }
    }

    /// Read one byte.
    ///
    /// # Errors
    /// `UnexpectedEof` when the source has no byte left.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeErrors> {
        if self.pushed > 0 {
            self.pushed -= 1;
            return Ok(self.pushback[self.pushed]);
        }

        let mut byte = [0_u8; 1];

        self.inner
            .read_exact(&mut byte)
            .map_err(|_| DecodeErrors::UnexpectedEof)?;

        Ok(byte[0])
    }

    /// Read two bytes and compose them big-endian.
    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16, DecodeErrors> {
        let bytes = [self.read_u8()?, self.read_u8()?];

        Ok(compose_be_u16(&bytes))
    }

    /// Fill `buf` completely or fail with `UnexpectedEof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeErrors> {
        let mut filled = 0;

        while self.pushed > 0 && filled < buf.len() {
            self.pushed -= 1;
            buf[filled] = self.pushback[self.pushed];
            filled += 1;
        }

        self.inner
            .read_exact(&mut buf[filled..])
            .map_err(|_| DecodeErrors::UnexpectedEof)
    }

    /// Read `len` bytes into a fresh vector.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, DecodeErrors> {
        let mut buf = vec![0; len];

        self.read_exact(&mut buf)?;

        Ok(buf)
    }

    /// Consume and discard `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeErrors> {
        for _ in 0..len {
            self.read_u8()?;
        }

        Ok(())
    }

    /// Push one byte back onto the reader.
    ///
    /// Bytes come back in reverse push order, so to unread a pair push the
    /// second byte first. Capacity is two bytes; pushing more is a caller
    /// bug.
    pub fn unread(&mut self, byte: u8) {
        debug_assert!(
            self.pushed < self.pushback.len(),
            "pushback capacity exceeded"
        );

        self.pushback[self.pushed] = byte;
        self.pushed += 1;
    }

    /// True when neither the pushback buffer nor the source holds a byte.
    pub fn at_end(&mut self) -> bool {
        if self.pushed > 0 {
            return false;
        }

        match self.inner.fill_buf() {
            Ok(buf) => buf.is_empty(),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::ByteReader;
    use crate::errors::DecodeErrors;

    #[test]
    fn sequential_reads() {
        let mut reader = ByteReader::new(Cursor::new(vec![0x01, 0xFF, 0xAB]));

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert!(!reader.at_end());
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert!(reader.at_end());
        assert!(matches!(reader.read_u8(), Err(DecodeErrors::UnexpectedEof)));
    }

    #[test]
    fn u16_is_big_endian() {
        let mut reader = ByteReader::new(Cursor::new(vec![0x01, 0xFF]));

        assert_eq!(reader.read_u16_be().unwrap(), 511);
    }

    #[test]
    fn pushback_restores_pairs() {
        let mut reader = ByteReader::new(Cursor::new(vec![0xFF, 0xDA, 0x33]));

        let first = reader.read_u8().unwrap();
        let second = reader.read_u8().unwrap();

        // second byte first so the pair comes back in stream order
        reader.unread(second);
        reader.unread(first);

        assert!(!reader.at_end());
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
        assert_eq!(reader.read_u8().unwrap(), 0xDA);
        assert_eq!(reader.read_u8().unwrap(), 0x33);
    }

    #[test]
    fn read_exact_drains_pushback_first() {
        let mut reader = ByteReader::new(Cursor::new(vec![0x03, 0x04]));

        reader.unread(0x02);
        reader.unread(0x01);

        let mut buf = [0_u8; 4];
        reader.read_exact(&mut buf).unwrap();

        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }
}
