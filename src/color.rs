// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Chroma upsampling and YCbCr → RGB conversion.
//!
//! Consumes the spatial-domain block grids and produces the final
//! tightly-packed, row-major RGB raster. Chroma is upsampled
//! nearest-neighbor: each luma pixel maps into the single Cb/Cr block stored
//! at its MCU anchor. The +128 level shift and the saturation to 0–255
//! happen here.

use rayon::prelude::*;

use super::dct::BlockGrid;
use super::frame::FrameHeader;

/// Convert the decoded block grids into `width * height * 3` RGB bytes.
///
/// Output rows are independent, so they are converted in parallel.
pub fn to_rgb(header: &FrameHeader, grids: &[BlockGrid]) -> Vec<u8> {
    let width = header.width as usize;
    let height = header.height as usize;

    let mut rgb = vec![0u8; width * height * 3];
    rgb.par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(y, row)| convert_row(header, grids, y, row));
    rgb
}

fn convert_row(header: &FrameHeader, grids: &[BlockGrid], y: usize, row: &mut [u8]) {
    let grayscale = header.num_components == 1;
    let v_max = header.v_max as usize;
    let h_max = header.h_max as usize;

    let block_row = y / 8;
    let pixel_row = y % 8;

    for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
        let block_col = x / 8;
        let luma = grids[0].block(block_row, block_col)[pixel_row * 8 + (x % 8)];

        if grayscale {
            let v = clamp_u8(luma + 128);
            pixel.copy_from_slice(&[v, v, v]);
            continue;
        }

        // The Cb/Cr block sits at the MCU anchor; (v, h) is this luma
        // block's offset inside the MCU.
        let v = block_row % v_max;
        let h = block_col % h_max;
        let cbcr_row = pixel_row / v_max + 4 * v;
        let cbcr_col = (x % 8) / h_max + 4 * h;
        let cbcr_pixel = cbcr_row * 8 + cbcr_col;
        let cb = grids[1].block(block_row - v, block_col - h)[cbcr_pixel] as f32;
        let cr = grids[2].block(block_row - v, block_col - h)[cbcr_pixel] as f32;
        let luma = luma as f32;

        let r = luma + 1.402 * cr + 128.0;
        let g = luma - 0.344 * cb - 0.714 * cr + 128.0;
        let b = luma + 1.772 * cb + 128.0;
        pixel.copy_from_slice(&[clamp_u8(r as i32), clamp_u8(g as i32), clamp_u8(b as i32)]);
    }
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameHeader;

    fn gray_header(width: u16, height: u16) -> FrameHeader {
        let mut header = FrameHeader::new();
        header
            .read_sof(&[8, (height >> 8) as u8, height as u8, (width >> 8) as u8, width as u8, 1, 1, 0x11, 0])
            .unwrap();
        header
    }

    #[test]
    fn grayscale_level_shift_and_clamp() {
        let header = gray_header(8, 8);
        let mut grid = BlockGrid::new(1, 1);
        grid.block_mut(0, 0)[0] = 0; // → 128
        grid.block_mut(0, 0)[1] = 200; // → clamped 255
        grid.block_mut(0, 0)[2] = -200; // → clamped 0
        let rgb = to_rgb(&header, &[grid]);
        assert_eq!(rgb.len(), 8 * 8 * 3);
        assert_eq!(&rgb[0..3], &[128, 128, 128]);
        assert_eq!(&rgb[3..6], &[255, 255, 255]);
        assert_eq!(&rgb[6..9], &[0, 0, 0]);
    }

    #[test]
    fn output_is_cropped_to_image_size() {
        // 10x10: two blocks per axis, but only 10 pixels per row survive.
        let header = gray_header(10, 10);
        let mut grid = BlockGrid::new(2, 2);
        for br in 0..2 {
            for bc in 0..2 {
                grid.block_mut(br, bc)[0] = (br * 2 + bc) as i32;
            }
        }
        let rgb = to_rgb(&header, &[grid]);
        assert_eq!(rgb.len(), 10 * 10 * 3);
        // Pixel (0, 9) falls in block (0, 1); DC-only blocks are not flat
        // here (no IDCT ran), so just check the right block was sampled.
        assert_eq!(rgb[9 * 3], 128 + 1);
        // Pixel (9, 9) falls in block (1, 1).
        assert_eq!(rgb[(9 * 10 + 9) * 3], 128 + 3);
    }

    fn ycbcr_header(sampling: u8) -> FrameHeader {
        let mut header = FrameHeader::new();
        header
            .read_sof(&[
                8, 0, 16, 0, 16, 3,
                1, sampling, 0,
                2, 0x11, 0,
                3, 0x11, 0,
            ])
            .unwrap();
        header
    }

    #[test]
    fn ycbcr_conversion_coefficients() {
        let header = ycbcr_header(0x11);
        let mut y_grid = BlockGrid::new(2, 2);
        let mut cb_grid = BlockGrid::new(2, 2);
        let mut cr_grid = BlockGrid::new(2, 2);
        y_grid.block_mut(0, 0)[0] = 0;
        cb_grid.block_mut(0, 0)[0] = 0;
        cr_grid.block_mut(0, 0)[0] = 64;
        let rgb = to_rgb(&header, &[y_grid, cb_grid, cr_grid]);
        // R = 0 + 1.402*64 + 128 = 217.7 → 217 (truncated)
        // G = 128 - 0.714*64 = 82.3 → 82
        // B = 128
        assert_eq!(&rgb[0..3], &[217, 82, 128]);
    }

    #[test]
    fn chroma_block_is_shared_across_the_mcu() {
        // 4:2:0: one chroma block covers four luma blocks. Pixel (8, 8) is
        // in luma block (1, 1) with offsets v = h = 1, so it samples chroma
        // position (0/2 + 4, 0/2 + 4) = (4, 4) of the anchor block.
        let header = ycbcr_header(0x22);
        let mut y_grid = BlockGrid::new(2, 2);
        let mut cb_grid = BlockGrid::new(2, 2);
        let cr_grid = BlockGrid::new(2, 2);
        y_grid.block_mut(1, 1)[0] = 0;
        cb_grid.block_mut(0, 0)[4 * 8 + 4] = 50;
        let rgb = to_rgb(&header, &[y_grid, cb_grid, cr_grid]);
        let pixel = &rgb[(8 * 16 + 8) * 3..][..3];
        // B = 0 + 1.772*50 + 128 = 216.6 → 216
        assert_eq!(pixel[2], 216);
    }
}
