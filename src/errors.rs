//! Contains most common errors that may be encountered in decoding a JPEG
//! image.
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use crate::misc::{
    START_OF_FRAME_EXT_AR, START_OF_FRAME_EXT_SEQ, START_OF_FRAME_LOS_SEQ,
    START_OF_FRAME_LOS_SEQ_AR, START_OF_FRAME_PROG_DCT, START_OF_FRAME_PROG_DCT_AR,
};

/// Common decode errors.
///
/// Decoding aborts on the first error; partial rasters are never returned.
#[allow(clippy::module_name_repetitions)]
pub enum DecodeErrors {
    /// The byte source ended while a required field or bit was expected
    UnexpectedEof,
    /// A segment's declared length, marker order or internal structure
    /// violates the format
    MalformedSegment(String),
    /// A Huffman length table overflows its tree, or the table cannot be
    /// assembled at all
    MalformedHuffman(String),
    /// The image uses an encoding feature outside the baseline subset
    Unsupported(UnsupportedFeature),
    /// Entropy decoding violated an invariant in the middle of a block
    CorruptScan(String),
}

impl Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof => {
                write!(f, "The byte stream ended before the image was complete")
            }
            Self::MalformedSegment(ref reason) => {
                write!(f, "Malformed segment. Reason:{reason}")
            }
            Self::MalformedHuffman(ref reason) => {
                write!(f, "Malformed Huffman table. Reason:{reason}")
            }
            Self::Unsupported(ref feature) => {
                write!(f, "{feature:?}")
            }
            Self::CorruptScan(ref reason) => {
                write!(f, "Corrupt entropy coded scan. Reason:{reason}")
            }
        }
    }
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl Error for DecodeErrors {}

/// Encoding features the decoder recognizes but refuses to decode.
///
/// Baseline here means sequential DCT, Huffman coded, 8-bit samples, one or
/// three components with sampling factors of one or two, no restart markers.
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum UnsupportedFeature {
    /// SOF_1, extended sequential DCT, Huffman coding
    ExtendedSequentialHuffman,
    /// SOF_2, progressive DCT, Huffman coding
    ProgressiveDctHuffman,
    /// SOF_3, lossless (sequential), Huffman coding
    LosslessHuffman,
    /// SOF_9, extended sequential DCT, arithmetic coding
    ExtendedSequentialDctArithmetic,
    /// SOF_10, progressive DCT, arithmetic coding
    ProgressiveDctArithmetic,
    /// SOF_11, lossless (sequential), arithmetic coding
    LosslessArithmetic,
    /// SOF_5..SOF_7 and SOF_13..SOF_15, hierarchical (differential) modes,
    /// and the DHP/EXP segments that accompany them
    Hierarchical,
    /// A DAC segment defining arithmetic coding conditioning
    ArithmeticCoding,
    /// Restart markers or a nonzero restart interval
    RestartMarkers,
    /// Sample precision other than eight bits
    SamplePrecision(u8),
    /// A component sampling factor outside {1, 2}
    SamplingFactor(u8, u8),
    /// A frame channel count other than one (grayscale) or three (YCbCr)
    ChannelCount(u8),
    /// More pixels than the decoder is willing to allocate a raster for
    LargeDimensions(usize),
}

impl Debug for UnsupportedFeature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtendedSequentialHuffman => {
                write!(f, "The library cannot decode images encoded with the Extended Sequential Huffman scheme")
            }
            Self::ProgressiveDctHuffman => {
                write!(f, "The library cannot decode images encoded with the Progressive DCT Huffman scheme")
            }
            Self::LosslessHuffman => {
                write!(f, "The library cannot decode images encoded with the Lossless Huffman scheme")
            }
            Self::ExtendedSequentialDctArithmetic => {
                write!(f, "The library cannot decode images encoded with the Extended Sequential DCT Arithmetic scheme")
            }
            Self::ProgressiveDctArithmetic => {
                write!(f, "The library cannot decode images encoded with the Progressive DCT Arithmetic scheme")
            }
            Self::LosslessArithmetic => {
                write!(f, "The library cannot decode images encoded with the Lossless Arithmetic scheme")
            }
            Self::Hierarchical => {
                write!(f, "The library cannot decode images encoded with hierarchical (differential) modes")
            }
            Self::ArithmeticCoding => {
                write!(f, "The library cannot decode images using arithmetic entropy coding")
            }
            Self::RestartMarkers => {
                write!(f, "The library cannot decode images that use restart markers")
            }
            Self::SamplePrecision(bits) => {
                write!(f, "The library can only decode 8-bit images, the image has {bits} bits of precision")
            }
            Self::SamplingFactor(h, v) => {
                write!(f, "The library only supports sampling factors of 1 or 2, found {h}x{v}")
            }
            Self::ChannelCount(count) => {
                write!(f, "The library only decodes grayscale (1) or YCbCr (3) images, the frame declares {count} channels")
            }
            Self::LargeDimensions(pixels) => {
                write!(f, "The frame declares {pixels} pixels, more than the library is willing to decode")
            }
        }
    }
}

impl UnsupportedFeature {
    /// Map a start-of-frame marker word to the scheme it announces.
    ///
    /// Returns `None` for `0xffc0` (baseline, which is supported) and for
    /// words that are not start-of-frame markers at all.
    #[must_use]
    pub fn from_int(int: u16) -> Option<UnsupportedFeature> {
        match int {
            START_OF_FRAME_PROG_DCT => Some(Self::ProgressiveDctHuffman),
            START_OF_FRAME_PROG_DCT_AR => Some(Self::ProgressiveDctArithmetic),
            START_OF_FRAME_LOS_SEQ => Some(Self::LosslessHuffman),
            START_OF_FRAME_LOS_SEQ_AR => Some(Self::LosslessArithmetic),
            START_OF_FRAME_EXT_SEQ => Some(Self::ExtendedSequentialHuffman),
            START_OF_FRAME_EXT_AR => Some(Self::ExtendedSequentialDctArithmetic),
            0xffc5..=0xffc7 | 0xffcd..=0xffcf => Some(Self::Hierarchical),
            _ => None,
        }
    }
}
