//! Main decoder logic.
//!
//! [`Decoder`] owns everything parsed out of the headers (the metadata
//! aggregate) and drives the two passes over the byte source: the marker
//! loop that fills the aggregate, then the scan decode in `mcu.rs` that
//! produces the raster.

use std::io::{BufRead, Cursor};

use crate::bytestream::ByteReader;
use crate::components::Components;
use crate::errors::{DecodeErrors, UnsupportedFeature};
use crate::headers::{
    parse_app, parse_comment, parse_dqt, parse_dri, parse_huffman, parse_start_of_frame,
    read_segment_length,
};
use crate::huffman::HuffmanTree;
use crate::image::Image;
use crate::marker::Marker;

/// Table slots addressable by DQT and DHT segments.
pub(crate) const MAX_TABLES: usize = 4;

/// Maximum pixel count the decoder will allocate a raster for.
pub(crate) const MAX_DIMENSIONS: usize = 1 << 27;

/// A JPEG decoder instance.
///
/// The decoder accepts baseline JFIF streams: sequential DCT, Huffman
/// coded, 8-bit precision, grayscale or YCbCr, sampling factors of one or
/// two. Everything else is rejected with a diagnostic error.
///
/// One instance can decode any number of images; parsed state is reset at
/// the start of every call.
///
/// # Examples
/// ```no_run
/// use baseline_jpeg::Decoder;
///
/// let file = std::fs::read("image.jpg").unwrap();
/// let image = Decoder::new()
///     .decode_buffer(&file)
///     .expect("could not decode the file");
///
/// println!("{}x{}", image.width(), image.height());
/// ```
pub struct Decoder {
    /// Frame information from SOF0
    pub(crate) info: ImageInfo,
    /// Quantization tables, zig-zag ordered, indexed by DQT slot
    pub(crate) qt_tables: [Option<[u16; 64]>; MAX_TABLES],
    /// DC Huffman tables indexed by DHT slot
    pub(crate) dc_huffman_tables: [Option<HuffmanTree>; MAX_TABLES],
    /// AC Huffman tables indexed by DHT slot
    pub(crate) ac_huffman_tables: [Option<HuffmanTree>; MAX_TABLES],
    /// Components in frame order
    pub(crate) components: Vec<Components>,
    /// Component positions in the order the scan interleaves them
    pub(crate) scan_order: Vec<usize>,
    /// Maximum horizontal sampling factor of all components
    pub(crate) h_max: usize,
    /// Maximum vertical sampling factor of all components
    pub(crate) v_max: usize,
    /// MCU pixel step along x, `8 * h_max`
    pub(crate) mcu_width: usize,
    /// MCU pixel step along y, `8 * v_max`
    pub(crate) mcu_height: usize,
    /// COM segment payloads in file order
    pub(crate) comments: Vec<Vec<u8>>,
    /// APPn payloads with their marker index, in file order
    pub(crate) app_segments: Vec<(u8, Vec<u8>)>,
    seen_sof: bool,
    seen_dht: bool,
    seen_dqt: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder {
            info: ImageInfo::default(),
            qt_tables: [None, None, None, None],
            dc_huffman_tables: [None, None, None, None],
            ac_huffman_tables: [None, None, None, None],
            components: vec![],
            scan_order: vec![],
            h_max: 1,
            v_max: 1,
            mcu_width: 0,
            mcu_height: 0,
            comments: vec![],
            app_segments: vec![],
            seen_sof: false,
            seen_dht: false,
            seen_dqt: false,
        }
    }
}

impl Decoder {
    /// Create a new decoder instance.
    #[must_use]
    pub fn new() -> Decoder {
        Decoder::default()
    }

    /// Decode a JPEG image already in memory.
    ///
    /// # Errors
    /// Any [`DecodeErrors`] variant; see the error type for the taxonomy.
    /// Nothing is returned on failure, partial rasters are never handed
    /// out.
    pub fn decode_buffer(&mut self, buf: &[u8]) -> Result<Image, DecodeErrors> {
        self.decode_from(Cursor::new(buf))
    }

    /// Decode a JPEG image from any buffered reader positioned at the
    /// start of the stream.
    ///
    /// The reader only needs to be sequential; the two-byte lookback the
    /// format requires is handled internally.
    ///
    /// # Errors
    /// See [`DecodeErrors`].
    pub fn decode_from<R>(&mut self, source: R) -> Result<Image, DecodeErrors>
    where
        R: BufRead,
    {
        self.reset();

        let mut reader = ByteReader::new(source);

        self.decode_headers(&mut reader)?;
        self.decode_scan(&mut reader)
    }

    /// Frame information of the last decoded image.
    ///
    /// Returns `None` before the first successful header parse.
    #[must_use]
    pub fn info(&self) -> Option<ImageInfo> {
        if self.info == ImageInfo::default() {
            return None;
        }

        Some(self.info.clone())
    }

    /// Width of the last decoded image.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.info.width
    }

    /// Height of the last decoded image.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.info.height
    }

    /// APPn segments collected from the last decoded image, as pairs of
    /// the marker index `n` and the raw payload.
    #[must_use]
    pub fn app_segments(&self) -> &[(u8, Vec<u8>)] {
        &self.app_segments
    }

    /// Drop state from a previous decode so the instance can be reused.
    fn reset(&mut self) {
        *self = Decoder::default();
    }

    /// Walk the segment stream up to the start of scan, collecting the
    /// metadata aggregate.
    ///
    /// On success the reader is positioned so the next two bytes are the
    /// `FF DA` scan marker.
    fn decode_headers<R>(&mut self, reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
    where
        R: BufRead,
    {
        // first two bytes must announce the image
        let magic = reader.read_u16_be()?;

        if magic != 0xffd8 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "expected a start of image marker at the stream start, found {magic:#06x}"
            )));
        }

        loop {
            if reader.at_end() {
                // ran out of segments without ever meeting a scan
                return Err(DecodeErrors::UnexpectedEof);
            }

            let lead = reader.read_u8()?;

            if lead != 0xFF {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "expected a marker, found stray byte {lead:#04x}"
                )));
            }

            let mut id = reader.read_u8()?;

            // repeated 0xFF bytes are legal fill in front of a marker
            while id == 0xFF {
                id = reader.read_u8()?;
            }

            if id == 0x00 {
                return Err(DecodeErrors::MalformedSegment(
                    "marker identifier cannot be zero".to_string(),
                ));
            }

            match Marker::from_u8(id) {
                Some(Marker::SOS) => {
                    // hand the marker back so the scan stage sees it
                    reader.unread(0xDA);
                    reader.unread(0xFF);
                    break;
                }
                Some(Marker::SOF(0)) => {
                    if self.seen_sof {
                        return Err(DecodeErrors::MalformedSegment(
                            "duplicate frame header".to_string(),
                        ));
                    }

                    debug!("Image encoding scheme =`Baseline DCT`");

                    parse_start_of_frame(self, reader)?;

                    self.seen_sof = true;
                }
                Some(Marker::SOF(_)) => {
                    let word = 0xff00 | u16::from(id);

                    return match UnsupportedFeature::from_int(word) {
                        Some(feature) => Err(DecodeErrors::Unsupported(feature)),
                        None => Err(DecodeErrors::MalformedSegment(format!(
                            "unknown frame type marker {word:#06x}"
                        ))),
                    };
                }
                Some(Marker::DHT) => {
                    parse_huffman(self, reader)?;
                    self.seen_dht = true;
                }
                Some(Marker::DQT) => {
                    parse_dqt(self, reader)?;
                    self.seen_dqt = true;
                }
                Some(Marker::COM) => parse_comment(self, reader)?,
                Some(Marker::APP(index)) => parse_app(self, index, reader)?,
                Some(Marker::DRI) => parse_dri(reader)?,
                Some(Marker::DAC) => {
                    return Err(DecodeErrors::Unsupported(UnsupportedFeature::ArithmeticCoding));
                }
                Some(Marker::RST(_)) => {
                    return Err(DecodeErrors::Unsupported(UnsupportedFeature::RestartMarkers));
                }
                Some(Marker::DHP | Marker::EXP) => {
                    return Err(DecodeErrors::Unsupported(UnsupportedFeature::Hierarchical));
                }
                Some(Marker::SOI) => {
                    return Err(DecodeErrors::MalformedSegment(
                        "second start of image marker".to_string(),
                    ));
                }
                Some(Marker::EOI) => {
                    // no payload; if nothing follows, the loop reports
                    // the missing scan
                    warn!("End of image marker before any scan data");
                }
                Some(marker @ (Marker::DNL | Marker::JPG(_))) => {
                    warn!("Skipping unhandled marker {:?}", marker);

                    let length = read_segment_length(reader)?;

                    reader.skip(usize::from(length))?;
                }
                None => {
                    return Err(DecodeErrors::MalformedSegment(format!(
                        "unknown marker identifier {id:#04x}"
                    )));
                }
            }
        }

        self.validate_headers()
    }

    /// The aggregate must be complete before entropy decoding starts.
    fn validate_headers(&mut self) -> Result<(), DecodeErrors> {
        if !self.seen_sof {
            return Err(DecodeErrors::MalformedSegment(
                "no frame header before the scan".to_string(),
            ));
        }

        if !self.seen_dht {
            return Err(DecodeErrors::MalformedSegment(
                "no huffman tables before the scan".to_string(),
            ));
        }

        if !self.seen_dqt {
            return Err(DecodeErrors::MalformedSegment(
                "no quantization tables before the scan".to_string(),
            ));
        }

        // resolve quantization tables into the components; DQT may
        // legally arrive after the frame header, so this happens last
        for component in &mut self.components {
            let slot = usize::from(component.quantization_table_id);

            match self.qt_tables[slot] {
                Some(table) => component.quantization_table = table,
                None => {
                    return Err(DecodeErrors::MalformedSegment(format!(
                        "no quantization table in slot {} for component {}",
                        slot, component.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A struct representing image information from the frame header.
#[derive(Default, Clone, Eq, PartialEq, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct ImageInfo {
    /// Width of the image
    pub width: u16,
    /// Height of the image
    pub height: u16,
    /// Bits per sample, always 8 once a frame was accepted
    pub precision: u8,
    /// Number of components, 1 or 3
    pub components: u8,
}
