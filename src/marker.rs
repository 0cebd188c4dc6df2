//! JPEG marker identifiers, ITU-T T.81 table B.1.
//!
//! A marker is the byte `0xFF` followed by a nonzero identifier byte; this
//! module maps identifier bytes to the segments the decoder knows about.

/// Markers the segment parser can meet between the start-of-image and the
/// entropy coded scan data.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Marker {
    /// Start of image
    SOI,
    /// End of image
    EOI,
    /// Start of scan
    SOS,
    /// Define quantization table(s)
    DQT,
    /// Define Huffman table(s)
    DHT,
    /// Define arithmetic coding conditioning
    DAC,
    /// Define number of lines
    DNL,
    /// Define restart interval
    DRI,
    /// Define hierarchical progression
    DHP,
    /// Expand reference component(s)
    EXP,
    /// Comment
    COM,
    /// Start of frame, `SOF(n)` for marker byte `0xC0 + n`
    SOF(u8),
    /// Restart marker `RST(n)` for marker byte `0xD0 + n`
    RST(u8),
    /// Application segment `APP(n)` for marker byte `0xE0 + n`
    APP(u8),
    /// Reserved for JPEG extensions, `0xC8` and `0xF0..=0xFD`
    JPG(u8),
}

impl Marker {
    /// Map a marker identifier byte to a known marker.
    ///
    /// Returns `None` for identifiers the decoder has no handling for at
    /// all (`0x00`, `0xFF`, the reserved `0x01..=0xBF` range).
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Marker> {
        match byte {
            0xC4 => Some(Marker::DHT),
            0xC8 => Some(Marker::JPG(0)),
            0xCC => Some(Marker::DAC),
            0xC0..=0xCF => Some(Marker::SOF(byte - 0xC0)),
            0xD0..=0xD7 => Some(Marker::RST(byte - 0xD0)),
            0xD8 => Some(Marker::SOI),
            0xD9 => Some(Marker::EOI),
            0xDA => Some(Marker::SOS),
            0xDB => Some(Marker::DQT),
            0xDC => Some(Marker::DNL),
            0xDD => Some(Marker::DRI),
            0xDE => Some(Marker::DHP),
            0xDF => Some(Marker::EXP),
            0xE0..=0xEF => Some(Marker::APP(byte - 0xE0)),
            0xF0..=0xFD => Some(Marker::JPG(byte - 0xF0)),
            0xFE => Some(Marker::COM),
            _ => None,
        }
    }
}
