//! This file exposes a single struct that can walk the entropy coded
//! segment of a JPEG file bit by bit.
//!
//! Bits are delivered MSB first within each byte. When destuffing is on,
//! the stream undoes the encoder's byte stuffing: an `FF 00` pair is a
//! literal data byte `0xFF`, while `0xFF` followed by anything else is a
//! real marker. The marker pair is pushed back onto the byte source and
//! the stream reports itself finished from then on, which is how the scan
//! decoder notices the end of the image data.
#![allow(dead_code)]

use std::io::BufRead;

use crate::bytestream::ByteReader;

/// A bit-level view over a [`ByteReader`].
///
/// The reader is borrowed per call rather than owned so the scan decoder
/// can interleave byte-level reads (markers) with bit-level ones.
pub(crate) struct BitStream {
    /// Byte currently being drained
    current: u8,
    /// Mask of the next bit to deliver, MSB first; zero means refill
    mask: u8,
    /// Strip stuffing bytes and stop at markers
    destuff: bool,
    finished: bool,
}

impl BitStream {
    /// Create a new bit stream.
    ///
    /// `destuff` is true for entropy coded scan data and false for plain
    /// bit-packed payloads.
    pub const fn new(destuff: bool) -> BitStream {
        BitStream {
            current: 0,
            mask: 0,
            destuff,
            finished: false,
        }
    }

    /// Pull the next byte out of the reader, handling stuffing.
    ///
    /// Returns false when the stream terminated instead, either on a
    /// marker or because the source ran dry.
    fn refill<R>(&mut self, reader: &mut ByteReader<R>) -> bool
    where
        R: BufRead,
    {
        let byte = match reader.read_u8() {
            Ok(byte) => byte,
            Err(_) => {
                self.finished = true;
                return false;
            }
        };

        if byte == 0xFF && self.destuff {
            match reader.read_u8() {
                // stuffing byte, the 0xFF is literal data
                Ok(0x00) => {}
                Ok(marker) => {
                    // a real marker ends the entropy coded segment; put
                    // both bytes back for whoever reads after us
                    reader.unread(marker);
                    reader.unread(0xFF);
                    self.finished = true;
                    return false;
                }
                Err(_) => {
                    self.finished = true;
                    return false;
                }
            }
        }

        self.current = byte;
        self.mask = 1 << 7;

        true
    }

    /// Return the next bit, or `None` once the stream has terminated.
    #[inline]
    pub fn next_bit<R>(&mut self, reader: &mut ByteReader<R>) -> Option<bool>
    where
        R: BufRead,
    {
        if self.finished {
            return None;
        }

        if self.mask == 0 && !self.refill(reader) {
            return None;
        }

        let bit = (self.current & self.mask) != 0;

        self.mask >>= 1;

        Some(bit)
    }

    /// Read `count` bits into an unsigned value, first bit most
    /// significant: each new bit shifts the running value left and is
    /// added in.
    ///
    /// If the stream terminates mid-read the partial value is returned
    /// and [`Self::is_finished`] turns true, so callers can wind down
    /// gracefully.
    pub fn next_bits<R>(&mut self, count: u8, reader: &mut ByteReader<R>) -> u16
    where
        R: BufRead,
    {
        let mut value = 0_u16;

        for _ in 0..count {
            match self.next_bit(reader) {
                Some(bit) => value = (value << 1) + u16::from(bit),
                None => break,
            }
        }

        value
    }

    /// Read eight bits as a byte.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_byte<R>(&mut self, reader: &mut ByteReader<R>) -> u8
    where
        R: BufRead,
    {
        self.next_bits(8, reader) as u8
    }

    /// True once a marker or the end of the source stopped the stream.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Recover the sign of a magnitude read from the bit stream.
///
/// A `num_bits` sized magnitude with its top bit set is positive as-is;
/// with the top bit clear it encodes `raw - 2^num_bits + 1`, a negative
/// value of the same category.
#[inline]
pub(crate) fn extend_sign(raw: u16, num_bits: u8) -> i32 {
    if num_bits == 0 {
        return 0;
    }

    if (raw >> (num_bits - 1)) == 0 {
        i32::from(raw) - (1 << num_bits) + 1
    } else {
        i32::from(raw)
    }
}
