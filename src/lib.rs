// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! # unjpeg
//!
//! Pure-Rust baseline JPEG decoder. Consumes a JFIF byte stream using SOF0
//! (baseline sequential DCT, 8-bit, Huffman-coded) and produces a
//! tightly-packed raster of 8-bit RGB pixels.
//!
//! Supports:
//! - Baseline sequential DCT (SOF0), 8-bit precision
//! - Grayscale (1 component) and YCbCr (3 components)
//! - Chroma subsampling 4:4:4, 4:2:2, 4:4:0, 4:2:0 (luma factors 1 or 2)
//! - Restart intervals (DRI/RST)
//! - 8- and 16-bit quantization tables, multiple tables per segment
//! - Zero-based component IDs (0,1,2 in place of 1,2,3)
//!
//! Does NOT support:
//! - Progressive DCT (SOF2) or any other non-SOF0 frame type
//! - Arithmetic coding — rejected at parse time
//! - CMYK and YIQ color modes
//! - APPn metadata (Exif, ICC); those segments are skipped unread
//!
//! # Quick start
//!
//! ```rust,ignore
//! let data = std::fs::read("photo.jpg")?;
//! let image = unjpeg::decode(&data)?;
//! std::fs::write("photo.bmp", unjpeg::bmp::encode_bmp(&image))?;
//! ```

pub mod bitio;
pub mod bmp;
pub mod color;
pub mod dct;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod marker;
pub mod scan;
pub mod tables;
pub mod zigzag;

use rayon::prelude::*;

pub use error::{JpegError, Result};
pub use frame::FrameHeader;

/// A decoded image: tightly-packed RGB bytes, row-major, top-to-bottom.
pub struct Image {
    width: u16,
    height: u16,
    rgb: Vec<u8>,
}

impl Image {
    pub(crate) fn new(width: u16, height: u16, rgb: Vec<u8>) -> Self {
        debug_assert_eq!(rgb.len(), width as usize * height as usize * 3);
        Self { width, height, rgb }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The raster: `width * height * 3` bytes, `[R, G, B]` per pixel.
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// Iterate over pixel rows, top to bottom.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator {
        self.rgb.chunks_exact(self.width as usize * 3)
    }

    pub fn into_rgb(self) -> Vec<u8> {
        self.rgb
    }
}

/// Decode a complete JPEG file into an RGB [`Image`].
///
/// The pipeline runs in fixed stages: marker parsing (header + unstuffed
/// scan data), entropy decoding into per-component coefficient grids,
/// dequantization and inverse DCT (parallel over blocks), then chroma
/// upsampling and color conversion (parallel over rows).
pub fn decode(data: &[u8]) -> Result<Image> {
    let header = marker::parse(data)?;
    let mut grids = scan::decode_scan(&header)?;

    for (i, grid) in grids.iter_mut().enumerate() {
        let component = &header.components[i];
        let qt = header.quant_tables[component.quant_table_id as usize]
            .as_ref()
            .ok_or(JpegError::InvalidSegment(
                "component references undefined quantization table",
            ))?;
        // Blocks are independent here; unpopulated chroma slots are all-zero
        // and stay that way through both transforms.
        grid.coeffs_mut().par_chunks_mut(64).for_each(|block| {
            dct::dequantize_block(block, qt);
            dct::idct_block(block);
        });
    }

    let rgb = color::to_rgb(&header, &grids);
    Ok(Image::new(header.width, header.height, rgb))
}
