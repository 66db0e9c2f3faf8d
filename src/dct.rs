// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Coefficient storage, dequantization, and the inverse DCT.
//!
//! [`BlockGrid`] stores one component's 8×8 blocks in block-raster order.
//! [`dequantize_block`] and [`idct_block`] together turn a block of
//! quantized DCT coefficients into spatial samples (still centered on zero;
//! the +128 level shift happens during color conversion).

use std::sync::OnceLock;

/// Quantization table: 64 divisors in natural (row-major) order, widened to
/// u16 so 16-bit DQT payloads fit.
#[derive(Debug, Clone)]
pub struct QuantTable {
    pub values: [u16; 64],
}

impl QuantTable {
    pub fn new(values: [u16; 64]) -> Self {
        Self { values }
    }
}

/// Grid of 8×8 blocks for one image component.
///
/// The grid is allocated at the *real* block dimensions (rounded up to even
/// where the luma sampling factor is 2), so partial MCUs at the right and
/// bottom edges have backing storage. Within each block the 64 values are in
/// natural (row-major) order.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    /// Flat storage: blocks_tall * blocks_wide * 64 coefficients.
    coeffs: Vec<i32>,
}

impl BlockGrid {
    /// Create a new grid initialized to zero.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            coeffs: vec![0i32; blocks_wide * blocks_tall * 64],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// The 64-coefficient block at (block row, block column).
    pub fn block(&self, br: usize, bc: usize) -> &[i32] {
        debug_assert!(br < self.blocks_tall && bc < self.blocks_wide);
        let start = (br * self.blocks_wide + bc) * 64;
        &self.coeffs[start..start + 64]
    }

    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [i32] {
        debug_assert!(br < self.blocks_tall && bc < self.blocks_wide);
        let start = (br * self.blocks_wide + bc) * 64;
        &mut self.coeffs[start..start + 64]
    }

    /// Raw mutable access to all coefficients, block-raster order, one
    /// 64-element chunk per block. Feeds rayon `par_chunks_mut(64)`.
    pub fn coeffs_mut(&mut self) -> &mut [i32] {
        &mut self.coeffs
    }
}

/// Multiply each coefficient by its quantization divisor, position by
/// position in natural order.
pub fn dequantize_block(block: &mut [i32], qt: &QuantTable) {
    debug_assert_eq!(block.len(), 64);
    for (coeff, &q) in block.iter_mut().zip(&qt.values) {
        *coeff *= i32::from(q);
    }
}

/// Scale and rotation constants for the AAN/Loeffler IDCT factorization.
struct IdctConsts {
    /// Per-frequency scale factors folded into the input:
    /// s[k] = cos(kπ/16) / sqrt(Nk), N0 = 8, Nk = 4 otherwise.
    s: [f32; 8],
    m1: f32,
    m2: f32,
    m3: f32,
    m4: f32,
    m5: f32,
}

static IDCT_CONSTS: OnceLock<IdctConsts> = OnceLock::new();

fn idct_consts() -> &'static IdctConsts {
    IDCT_CONSTS.get_or_init(|| {
        let pi = std::f32::consts::PI;
        let mut s = [0f32; 8];
        s[0] = 1.0 / 8.0f32.sqrt();
        for (k, slot) in s.iter_mut().enumerate().skip(1) {
            *slot = (k as f32 * pi / 16.0).cos() / 2.0;
        }
        let m0 = 2.0 * (pi / 8.0).cos();
        let m1 = 2.0 * (pi / 4.0).cos();
        let m5 = 2.0 * (3.0 * pi / 8.0).cos();
        IdctConsts {
            s,
            m1,
            m2: m0 - m5,
            m3: m1,
            m4: m0 + m5,
            m5,
        }
    })
}

/// The 1-D IDCT butterfly over 8 pre-scaled inputs.
#[allow(clippy::many_single_char_names)]
fn idct_1d(g: [f32; 8], k: &IdctConsts) -> [f32; 8] {
    let [g0, g1, g2, g3, g4, g5, g6, g7] = g;

    let f4 = g4 - g7;
    let f5 = g5 + g6;
    let f6 = g5 - g6;
    let f7 = g4 + g7;

    let e2 = g2 - g3;
    let e3 = g2 + g3;
    let e5 = f5 - f7;
    let e7 = f5 + f7;
    let e8 = f4 + f6;

    let d2 = e2 * k.m1;
    let d4 = f4 * k.m2;
    let d5 = e5 * k.m3;
    let d6 = f6 * k.m4;
    let d8 = e8 * k.m5;

    let c0 = g0 + g1;
    let c1 = g0 - g1;
    let c2 = d2 - e3;
    let c4 = d4 + d8;
    let c5 = d5 + e7;
    let c6 = d6 - d8;
    let c8 = c5 - c6;

    let b0 = c0 + e3;
    let b1 = c1 + c2;
    let b2 = c1 - c2;
    let b3 = c0 - e3;
    let b4 = c4 - c8;
    let b6 = c6 - e7;

    [
        b0 + e7,
        b1 + b6,
        b2 + c8,
        b3 + b4,
        b3 - b4,
        b2 - c8,
        b1 - b6,
        b0 - e7,
    ]
}

/// 2-D 8×8 inverse DCT: a fast 1-D pass over each column, then each row.
///
/// Intermediates stay in f32 across both passes; the result is rounded into
/// the block with no clamping (the color pass saturates).
pub fn idct_block(block: &mut [i32]) {
    debug_assert_eq!(block.len(), 64);
    let k = idct_consts();

    let mut tmp = [0f32; 64];
    for col in 0..8 {
        let g = [
            block[col] as f32 * k.s[0],
            block[4 * 8 + col] as f32 * k.s[4],
            block[2 * 8 + col] as f32 * k.s[2],
            block[6 * 8 + col] as f32 * k.s[6],
            block[5 * 8 + col] as f32 * k.s[5],
            block[8 + col] as f32 * k.s[1],
            block[7 * 8 + col] as f32 * k.s[7],
            block[3 * 8 + col] as f32 * k.s[3],
        ];
        let out = idct_1d(g, k);
        for (row, &v) in out.iter().enumerate() {
            tmp[row * 8 + col] = v;
        }
    }

    for row in 0..8 {
        let base = row * 8;
        let g = [
            tmp[base] * k.s[0],
            tmp[base + 4] * k.s[4],
            tmp[base + 2] * k.s[2],
            tmp[base + 6] * k.s[6],
            tmp[base + 5] * k.s[5],
            tmp[base + 1] * k.s[1],
            tmp[base + 7] * k.s[7],
            tmp[base + 3] * k.s[3],
        ];
        let out = idct_1d(g, k);
        for (col, &v) in out.iter().enumerate() {
            block[base + col] = v.round() as i32;
        }
    }
}
