//! Per-component state extracted from the frame header.
//!
//! A component descriptor arrives as three bytes in the SOF0 segment; the
//! scan header later fills in which Huffman tables the component uses, and
//! the decoder threads the running DC prediction through here while the
//! scan is decoded.

use crate::errors::{DecodeErrors, UnsupportedFeature};
use crate::misc::split_byte;

/// Component data from the start of frame, plus the mutable scan state
/// that belongs to the component.
#[derive(Clone)]
pub(crate) struct Components {
    /// Identifier the scan header refers back to, usually 1..=3
    pub id: u8,
    /// Sampling factor along the x axis, 1 or 2
    pub horizontal_sample: usize,
    /// Sampling factor along the y axis, 1 or 2
    pub vertical_sample: usize,
    /// Quantization table slot from the frame header
    pub quantization_table_id: u8,
    /// The resolved quantization table, zig-zag ordered.
    /// Filled once all headers are in.
    pub quantization_table: [u16; 64],
    /// DC Huffman table slot, from the scan header
    pub dc_huff_table: usize,
    /// AC Huffman table slot, from the scan header
    pub ac_huff_table: usize,
    /// Running DC prediction for this component
    pub dc_pred: i32,
}

impl Components {
    /// Build a component from its three frame header bytes.
    pub fn from(bytes: [u8; 3], table_slots: usize) -> Result<Components, DecodeErrors> {
        let id = bytes[0];

        let (horizontal_sample, vertical_sample) = split_byte(bytes[1]);

        if !(1..=2).contains(&horizontal_sample) || !(1..=2).contains(&vertical_sample) {
            return Err(DecodeErrors::Unsupported(UnsupportedFeature::SamplingFactor(
                horizontal_sample,
                vertical_sample,
            )));
        }

        let quantization_table_id = bytes[2];

        if usize::from(quantization_table_id) >= table_slots {
            return Err(DecodeErrors::MalformedSegment(format!(
                "quantization table number too large:{quantization_table_id}, expected a value below {table_slots}"
            )));
        }

        info!(
            "Component ID:{}\tHS:{} VS:{} QT:{}",
            id, horizontal_sample, vertical_sample, quantization_table_id
        );

        Ok(Components {
            id,
            horizontal_sample: usize::from(horizontal_sample),
            vertical_sample: usize::from(vertical_sample),
            quantization_table_id,
            quantization_table: [0; 64],
            // these two are set by the scan header
            dc_huff_table: 0,
            ac_huff_table: 0,
            dc_pred: 0,
        })
    }
}
