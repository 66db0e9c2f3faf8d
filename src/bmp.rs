// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Minimal BMP serialization for decoded images.
//!
//! Writes the oldest BMP flavor (BITMAPCOREHEADER, 12-byte DIB header):
//! 24-bit pixels in B,G,R order, rows bottom-up, each row zero-padded to a
//! 4-byte boundary.

use super::Image;

/// Serialize an [`Image`] as a BMP file.
pub fn encode_bmp(image: &Image) -> Vec<u8> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let padding = (4 - (width * 3) % 4) % 4;
    let size = 14 + 12 + (width * 3 + padding) * height;

    let mut out = Vec::with_capacity(size);
    out.push(b'B');
    out.push(b'M');
    put_u32(&mut out, size as u32);
    put_u32(&mut out, 0);
    put_u32(&mut out, 0x1A); // pixel data offset
    put_u32(&mut out, 12); // DIB header size
    put_u16(&mut out, image.width());
    put_u16(&mut out, image.height());
    put_u16(&mut out, 1); // planes
    put_u16(&mut out, 24); // bits per pixel

    for row in image.rows().rev() {
        for pixel in row.chunks_exact(3) {
            out.push(pixel[2]);
            out.push(pixel[1]);
            out.push(pixel[0]);
        }
        for _ in 0..padding {
            out.push(0);
        }
    }

    out
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}
