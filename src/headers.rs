//! Decode JPEG markers/segments
//!
//! This file deals with decoding header information from the segments
//! between the start-of-image marker and the entropy coded scan data.
//!
//! A good guide on markers can be found [here](http://vip.sugovica.hu/Sardi/kepnezo/JPEG%20File%20Layout%20and%20Format.htm)

use std::cmp::max;
use std::io::BufRead;

use crate::bytestream::ByteReader;
use crate::components::Components;
use crate::decoder::{Decoder, MAX_DIMENSIONS, MAX_TABLES};
use crate::errors::{DecodeErrors, UnsupportedFeature};
use crate::huffman::HuffmanTree;
use crate::misc::split_byte;

/// Read a segment's 16-bit length field and return the payload size, i.e.
/// the declared count minus the two bytes of the count itself.
pub fn read_segment_length<R>(reader: &mut ByteReader<R>) -> Result<u16, DecodeErrors>
where
    R: BufRead,
{
    let length = reader.read_u16_be()?;

    if length < 2 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "segment length {length} is less than 2"
        )));
    }

    Ok(length - 2)
}

/// **B.2.4.2 Huffman table-specification syntax**
///
/// |Field                      |Size          |Description
/// ----------------------------|--------------|-------------------------------------------------
/// |Length                     |2 bytes       |Length of the whole segment
/// |HT information             |1 byte        |high nibble: 0 = DC table, 1 = AC table
/// |                           |              |low nibble: table slot, 0..=3
/// |Number of symbols          |16 bytes      |Number of codes of length 1..=16; the sum is the
/// |                           |              |total symbol count and must be <= 256
/// |Symbols                    |n bytes       |Symbols in order of increasing code length
///
/// A single DHT segment may pack several tables back to back; the payload
/// must be consumed exactly.
pub fn parse_huffman<R>(decoder: &mut Decoder, reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let mut length_left = read_segment_length(reader)?;

    // a table needs at least its info byte and the sixteen counts
    while length_left > 16 {
        let ht_info = reader.read_u8()?;

        let (class, index) = split_byte(ht_info);

        if class > 1 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "invalid table class {class} in DHT, expected 0 (DC) or 1 (AC)"
            )));
        }

        if usize::from(index) >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "DHT table slot {index} out of range, expected a value below {MAX_TABLES}"
            )));
        }

        let mut counts = [0_u8; 16];

        reader.read_exact(&mut counts)?;

        let symbols_sum: u16 = counts.iter().map(|count| u16::from(*count)).sum();

        // 2^16 codes could hold more, but a symbol is a byte
        if symbols_sum > 256 {
            return Err(DecodeErrors::MalformedHuffman(format!(
                "table declares {symbols_sum} symbols, more than the 256 leaf capacity"
            )));
        }

        let consumed = 17 + symbols_sum;

        if consumed > length_left {
            return Err(DecodeErrors::MalformedSegment(
                "huffman table runs past its segment length".to_string(),
            ));
        }

        let symbols = reader.read_vec(usize::from(symbols_sum))?;

        let table = HuffmanTree::from_lengths(&counts, &symbols)?;

        match class {
            0 => decoder.dc_huffman_tables[usize::from(index)] = Some(table),
            _ => decoder.ac_huffman_tables[usize::from(index)] = Some(table),
        }

        length_left -= consumed;
    }

    if length_left != 0 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "huffman table section not fully consumed, {length_left} bytes left over"
        )));
    }

    Ok(())
}

/// **B.2.4.1 Quantization table-specification syntax**
///
/// |Field               |Size                   |Description
/// ---------------------|-----------------------|-------------------------
/// |Length              |2 bytes                |Length of the whole segment
/// |QT information      |1 byte                 |high nibble: 0 = 1-byte entries, 1 = 2-byte entries
/// |                    |                       |low nibble: table slot, 0..=3
/// |Values              |64 or 128 bytes        |64 entries in zig-zag order
///
/// Like DHT, one segment may pack several tables.
pub fn parse_dqt<R>(decoder: &mut Decoder, reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let mut length_left = read_segment_length(reader)?;

    while length_left > 0 {
        let qt_info = reader.read_u8()?;

        let (precision, table_position) = split_byte(qt_info);

        // validate the nibble before touching any coefficient
        if precision > 1 {
            return Err(DecodeErrors::MalformedSegment(format!(
                "invalid DQT precision {precision}, expected 0 (byte) or 1 (word) entries"
            )));
        }

        if usize::from(table_position) >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "DQT table slot {table_position} out of range, expected a value below {MAX_TABLES}"
            )));
        }

        let entry_width = u16::from(precision) + 1;
        let consumed = 1 + 64 * entry_width;

        if consumed > length_left {
            return Err(DecodeErrors::MalformedSegment(
                "quantization table runs past its segment length".to_string(),
            ));
        }

        // values stay in zig-zag order; the entropy decoder multiplies
        // them in index for index
        let mut table = [0_u16; 64];

        for value in &mut table {
            *value = if precision == 0 {
                u16::from(reader.read_u8()?)
            } else {
                reader.read_u16_be()?
            };
        }

        decoder.qt_tables[usize::from(table_position)] = Some(table);

        length_left -= consumed;
    }

    Ok(())
}

/// Section: `B.2.2 Frame header syntax`
///
/// | Field              |Size        |Description
/// ---------------------|------------|-----------------
/// | Length             |2 bytes     |Equals 8 + 3 * components
/// | Data precision     |1 byte      |Bits per sample, only 8 is supported
/// | Image height       |2 bytes     |Must be > 0
/// | Image width        |2 bytes     |Must be > 0
/// | Components         |1 byte      |1 = grayscale, 3 = YCbCr
/// | Each component     |3 bytes     |id, packed sampling factors, quantization table slot
pub(crate) fn parse_start_of_frame<R>(
    decoder: &mut Decoder, reader: &mut ByteReader<R>,
) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let length = read_segment_length(reader)?;

    // usually 8, but can be 12 and 16; we only support 8
    let precision = reader.read_u8()?;

    if precision != 8 {
        return Err(DecodeErrors::Unsupported(UnsupportedFeature::SamplePrecision(precision)));
    }

    decoder.info.precision = precision;

    let height = reader.read_u16_be()?;
    let width = reader.read_u16_be()?;

    if width == 0 || height == 0 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "frame dimensions {width}x{height} contain a zero"
        )));
    }

    let dimensions = usize::from(width) * usize::from(height);

    if dimensions > MAX_DIMENSIONS {
        return Err(DecodeErrors::Unsupported(UnsupportedFeature::LargeDimensions(dimensions)));
    }

    decoder.info.width = width;
    decoder.info.height = height;

    let num_components = reader.read_u8()?;

    if num_components != 1 && num_components != 3 {
        return Err(DecodeErrors::Unsupported(UnsupportedFeature::ChannelCount(num_components)));
    }

    if length != u16::from(6 + 3 * num_components) {
        return Err(DecodeErrors::MalformedSegment(format!(
            "frame header length should be {}, found {}",
            8 + 3 * num_components,
            length + 2
        )));
    }

    decoder.info.components = num_components;

    let mut components = Vec::with_capacity(usize::from(num_components));
    let mut bytes = [0_u8; 3];

    for _ in 0..num_components {
        reader.read_exact(&mut bytes)?;

        components.push(Components::from(bytes, MAX_TABLES)?);
    }

    for component in &components {
        decoder.h_max = max(decoder.h_max, component.horizontal_sample);
        decoder.v_max = max(decoder.v_max, component.vertical_sample);
    }

    // pixel step of one interleaved MCU
    decoder.mcu_width = decoder.h_max * 8;
    decoder.mcu_height = decoder.v_max * 8;

    decoder.components = components;

    debug!(
        "Frame: {}x{}, {} component(s), MCU step {}x{}",
        width, height, num_components, decoder.mcu_width, decoder.mcu_height
    );

    Ok(())
}

/// Section: `B.2.3 Scan header syntax`
///
/// After the per-component table selections come three fixed bytes, the
/// spectral selection range (0, 63) and the successive approximation
/// positions (0, 0). Anything else is a progressive scan in disguise and
/// is rejected rather than misread.
pub fn parse_sos<R>(decoder: &mut Decoder, reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let length = read_segment_length(reader)?;

    let num_scans = reader.read_u8()?;

    if usize::from(num_scans) != decoder.components.len() {
        return Err(DecodeErrors::MalformedSegment(format!(
            "scan selects {} component(s), frame declares {}",
            num_scans,
            decoder.components.len()
        )));
    }

    if length != u16::from(4 + 2 * num_scans) {
        return Err(DecodeErrors::MalformedSegment(format!(
            "scan header length should be {}, found {}",
            6 + 2 * num_scans,
            length + 2
        )));
    }

    decoder.scan_order.clear();

    for _ in 0..num_scans {
        let id = reader.read_u8()?;

        let position = decoder
            .components
            .iter()
            .position(|component| component.id == id)
            .ok_or_else(|| {
                DecodeErrors::MalformedSegment(format!(
                    "scan refers to component id {id} which the frame does not declare"
                ))
            })?;

        let (dc_table, ac_table) = split_byte(reader.read_u8()?);

        if usize::from(dc_table) >= MAX_TABLES || usize::from(ac_table) >= MAX_TABLES {
            return Err(DecodeErrors::MalformedSegment(format!(
                "scan table slots {dc_table}/{ac_table} out of range, expected values below {MAX_TABLES}"
            )));
        }

        decoder.components[position].dc_huff_table = usize::from(dc_table);
        decoder.components[position].ac_huff_table = usize::from(ac_table);

        decoder.scan_order.push(position);
    }

    let spectral_start = reader.read_u8()?;
    let spectral_end = reader.read_u8()?;
    let approximation = reader.read_u8()?;

    if spectral_start != 0 || spectral_end != 0x3F || approximation != 0 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "non-baseline scan parameters ({spectral_start}, {spectral_end}, {approximation}), expected (0, 63, 0)"
        )));
    }

    Ok(())
}

/// Collect a COM segment as an uninterpreted byte string.
pub fn parse_comment<R>(decoder: &mut Decoder, reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let length = read_segment_length(reader)?;

    let comment = reader.read_vec(usize::from(length))?;

    debug!("COM segment, {} byte(s)", comment.len());

    decoder.comments.push(comment);

    Ok(())
}

/// Collect an APPn segment opaquely; nothing in it affects decoding.
pub fn parse_app<R>(
    decoder: &mut Decoder, index: u8, reader: &mut ByteReader<R>,
) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let length = read_segment_length(reader)?;

    let payload = reader.read_vec(usize::from(length))?;

    debug!("APP{} segment, {} byte(s)", index, payload.len());

    decoder.app_segments.push((index, payload));

    Ok(())
}

/// A DRI segment announces restart markers inside the scan, which the
/// decoder does not handle; a zero interval disables them and is let
/// through.
pub fn parse_dri<R>(reader: &mut ByteReader<R>) -> Result<(), DecodeErrors>
where
    R: BufRead,
{
    let length = read_segment_length(reader)?;

    if length != 2 {
        return Err(DecodeErrors::MalformedSegment(format!(
            "restart interval segment length should be 4, found {}",
            length + 2
        )));
    }

    let interval = reader.read_u16_be()?;

    if interval != 0 {
        return Err(DecodeErrors::Unsupported(UnsupportedFeature::RestartMarkers));
    }

    Ok(())
}
