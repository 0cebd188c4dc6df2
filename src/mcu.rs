//! Implements routines to decode the entropy coded scan MCU by MCU.
//!
//! Components are interleaved in scan order inside each MCU; every
//! component contributes `Hi * Vi` blocks read row-major over its
//! sampling grid. A decoded block goes through dequantization, the
//! inverse zig-zag, the inverse DCT and the level shift before its
//! samples are placed into the raster, replicating subsampled components
//! nearest-neighbour.

use std::io::BufRead;

use crate::bitstream::{extend_sign, BitStream};
use crate::bytestream::ByteReader;
use crate::color_convert::{clamp, ycbcr_to_rgb};
use crate::decoder::Decoder;
use crate::errors::DecodeErrors;
use crate::headers::parse_sos;
use crate::huffman::HuffmanTree;
use crate::idct::Idct8x8;
use crate::image::Image;
use crate::misc::{from_zigzag, split_byte};

/// Coefficients per block.
pub const DCT_BLOCK: usize = 64;

impl Decoder {
    /// Decode the scan that the header pass stopped in front of and
    /// return the finished raster.
    pub(crate) fn decode_scan<R>(&mut self, reader: &mut ByteReader<R>) -> Result<Image, DecodeErrors>
    where
        R: BufRead,
    {
        // the header pass pushed the scan marker back for us
        let marker = [reader.read_u8()?, reader.read_u8()?];

        if marker != [0xFF, 0xDA] {
            return Err(DecodeErrors::MalformedSegment(
                "start of scan marker expected".to_string(),
            ));
        }

        parse_sos(self, reader)?;

        // fail on missing tables here rather than in the middle of the
        // entropy coded data
        for &position in &self.scan_order {
            let component = &self.components[position];

            if self.dc_huffman_tables[component.dc_huff_table].is_none() {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "no DC huffman table in slot {} for component {}",
                    component.dc_huff_table, component.id
                )));
            }

            if self.ac_huffman_tables[component.ac_huff_table].is_none() {
                return Err(DecodeErrors::MalformedSegment(format!(
                    "no AC huffman table in slot {} for component {}",
                    component.ac_huff_table, component.id
                )));
            }
        }

        let width = usize::from(self.info.width);
        let height = usize::from(self.info.height);

        let step_x = self.mcu_width;
        let step_y = self.mcu_height;

        // the transform plan lives exactly as long as this scan
        let idct = Idct8x8::new();
        let mut stream = BitStream::new(true);
        let mut image = Image::new(self.info.width, self.info.height);

        for component in &mut self.components {
            component.dc_pred = 0;
        }

        // per-component sample blocks of the MCU in flight
        let mut mcu: Vec<Vec<[u8; DCT_BLOCK]>> = self
            .scan_order
            .iter()
            .map(|&position| {
                let component = &self.components[position];

                vec![[0; DCT_BLOCK]; component.horizontal_sample * component.vertical_sample]
            })
            .collect();

        let (mut cur_x, mut cur_y) = (0_usize, 0_usize);

        while !stream.is_finished() && cur_x < width && cur_y < height {
            self.decode_mcu(reader, &mut stream, &idct, &mut mcu)?;

            self.write_mcu(&mcu, cur_x, cur_y, &mut image);

            cur_x += step_x;

            if cur_x >= width {
                cur_x = 0;
                cur_y += step_y;
            }
        }

        // the entropy coded data must run straight into the end of image
        // marker; a truncated source dies here with UnexpectedEof
        let trailer = [reader.read_u8()?, reader.read_u8()?];

        if trailer != [0xFF, 0xD9] {
            return Err(DecodeErrors::MalformedSegment(format!(
                "end of image marker expected after the scan, found {:#04x} {:#04x}",
                trailer[0], trailer[1]
            )));
        }

        debug!("Finished decoding image");

        if let Some(comment) = self.comments.last() {
            image.set_comment(comment.clone());
        }

        Ok(image)
    }

    /// Decode one MCU worth of blocks for every scan component.
    fn decode_mcu<R>(
        &mut self, reader: &mut ByteReader<R>, stream: &mut BitStream, idct: &Idct8x8,
        mcu: &mut [Vec<[u8; DCT_BLOCK]>],
    ) -> Result<(), DecodeErrors>
    where
        R: BufRead,
    {
        for (blocks, &position) in mcu.iter_mut().zip(self.scan_order.iter()) {
            let component = &mut self.components[position];

            // checked before the loop started
            let dc_table = self.dc_huffman_tables[component.dc_huff_table]
                .as_ref()
                .ok_or_else(|| {
                    DecodeErrors::MalformedSegment("DC huffman table disappeared".to_string())
                })?;
            let ac_table = self.ac_huffman_tables[component.ac_huff_table]
                .as_ref()
                .ok_or_else(|| {
                    DecodeErrors::MalformedSegment("AC huffman table disappeared".to_string())
                })?;

            // row-major over the component's Hi x Vi sampling grid
            for block in blocks.iter_mut() {
                *block = decode_block(
                    reader,
                    stream,
                    dc_table,
                    ac_table,
                    &component.quantization_table,
                    idct,
                    &mut component.dc_pred,
                )?;
            }
        }

        Ok(())
    }

    /// Convert the MCU's samples to RGB and place them into the raster.
    /// Pixels that fall past the image edge in a boundary MCU are
    /// discarded.
    fn write_mcu(&self, mcu: &[Vec<[u8; DCT_BLOCK]>], cur_x: usize, cur_y: usize, image: &mut Image) {
        let width = usize::from(self.info.width);
        let height = usize::from(self.info.height);

        for y_off in 0..self.mcu_height {
            if cur_y + y_off >= height {
                break;
            }

            for x_off in 0..self.mcu_width {
                if cur_x + x_off >= width {
                    break;
                }

                let y = self.sample(mcu, 0, x_off, y_off);

                let rgb = if mcu.len() == 3 {
                    let cb = self.sample(mcu, 1, x_off, y_off);
                    let cr = self.sample(mcu, 2, x_off, y_off);

                    ycbcr_to_rgb(y, cb, cr)
                } else {
                    // grayscale replicates luma into all channels
                    [y, y, y]
                };

                image.set_pixel(cur_y + y_off, cur_x + x_off, rgb);
            }
        }
    }

    /// Look up one component sample at an MCU-local pixel position.
    ///
    /// A component sampled below the MCU's maximum factor covers several
    /// pixels per sample; the pixel coordinate divides down by the factor
    /// ratio, which is nearest-neighbour replication.
    fn sample(&self, mcu: &[Vec<[u8; DCT_BLOCK]>], scan_position: usize, x_off: usize, y_off: usize) -> u8 {
        let component = &self.components[self.scan_order[scan_position]];

        let cx = x_off / (self.h_max / component.horizontal_sample);
        let cy = y_off / (self.v_max / component.vertical_sample);

        let block = &mcu[scan_position][(cy / 8) * component.horizontal_sample + (cx / 8)];

        block[(cy % 8) * 8 + (cx % 8)]
    }
}

/// Decode a single 8x8 block: entropy decode the coefficients, then run
/// them through dequantization, un-zig-zag, inverse DCT and level shift.
///
/// The bit stream terminating mid-block is not an error; the block is
/// completed as if an end-of-block had arrived and the caller's MCU loop
/// stops afterwards.
fn decode_block<R>(
    reader: &mut ByteReader<R>, stream: &mut BitStream, dc_table: &HuffmanTree,
    ac_table: &HuffmanTree, quantization_table: &[u16; DCT_BLOCK], idct: &Idct8x8,
    dc_pred: &mut i32,
) -> Result<[u8; DCT_BLOCK], DecodeErrors>
where
    R: BufRead,
{
    // coefficients accumulate in zig-zag order
    let mut block = [0_i32; DCT_BLOCK];

    // the DC coefficient arrives as a difference from the previous block
    // of this component
    let difference = match dc_table.decode_symbol(stream, reader)? {
        Some(0) | None => 0,
        Some(symbol) => {
            let (_, num_bits) = split_byte(symbol);

            let raw = stream.next_bits(num_bits, reader);

            extend_sign(raw, num_bits)
        }
    };

    *dc_pred += difference;
    block[0] = *dc_pred;

    let mut position = 1;

    while position < DCT_BLOCK && !stream.is_finished() {
        let symbol = match ac_table.decode_symbol(stream, reader)? {
            Some(symbol) => symbol,
            // stream died mid block, treat it as an end of block
            None => break,
        };

        match symbol {
            // EOB, the rest of the block stays zero
            0x00 => break,
            // ZRL, sixteen zeroes
            0xF0 => position += 16,
            _ => {
                let (run, size) = split_byte(symbol);

                position += usize::from(run);

                if position >= DCT_BLOCK {
                    return Err(DecodeErrors::CorruptScan(format!(
                        "AC coefficient run goes past the block end to position {position}"
                    )));
                }

                let raw = stream.next_bits(size, reader);

                block[position] = extend_sign(raw, size);
                position += 1;
            }
        }
    }

    // dequantize; both sides are zig-zag ordered so this is index for
    // index
    for (value, &scale) in block.iter_mut().zip(quantization_table.iter()) {
        *value *= i32::from(scale);
    }

    let natural = from_zigzag(&block);

    let mut coefficients = [0.0_f64; DCT_BLOCK];

    for (slot, &value) in coefficients.iter_mut().zip(natural.iter()) {
        *slot = f64::from(value);
    }

    let spatial = idct.transform(&coefficients);

    // level shift back into display range
    let mut samples = [0_u8; DCT_BLOCK];

    #[allow(clippy::cast_possible_truncation)]
    for (sample, &value) in samples.iter_mut().zip(spatial.iter()) {
        *sample = clamp((value + 128.0).round() as i32);
    }

    Ok(samples)
}
