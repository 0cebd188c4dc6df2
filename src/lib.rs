//! A baseline JPEG (JFIF) decoder.
//!
//! Consumes a sequential, Huffman coded, 8-bit JPEG byte stream and
//! produces a raster of 8-bit RGB triples. Grayscale and YCbCr images
//! with 4:4:4, 4:2:2, 4:4:0 and 4:2:0 subsampling are supported;
//! progressive, arithmetic, hierarchical, lossless and restart-marker
//! streams are rejected with a diagnostic error.
//!
//! ```no_run
//! use baseline_jpeg::Decoder;
//!
//! let data = std::fs::read("image.jpg").unwrap();
//! let image = Decoder::new().decode_buffer(&data).unwrap();
//!
//! assert_eq!(
//!     image.pixels().len(),
//!     usize::from(image.width()) * usize::from(image.height()) * 3
//! );
//! ```
#![allow(clippy::needless_return, clippy::similar_names)]
#![warn(clippy::correctness, clippy::perf, clippy::pedantic)]
#[macro_use]
extern crate log;

pub use crate::decoder::{Decoder, ImageInfo};
pub use crate::errors::{DecodeErrors, UnsupportedFeature};
pub use crate::image::Image;

mod bitstream;
mod bytestream;
mod color_convert;
mod components;
mod decoder;
pub mod errors;
mod headers;
mod huffman;
mod idct;
mod image;
mod marker;
mod mcu;
mod misc;
