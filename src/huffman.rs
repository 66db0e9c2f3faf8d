// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Canonical Huffman tables for JPEG entropy decoding.

use super::bitio::BitReader;
use super::error::{JpegError, Result};

/// The largest number of symbols any baseline table may carry (the standard
/// AC tables use all 162).
pub const MAX_SYMBOLS: usize = 162;

/// A decoded DHT table: cumulative per-length offsets into the symbol list,
/// plus the canonical codes derived from them.
///
/// `offsets[i]..offsets[i + 1]` indexes the symbols whose codes are `i + 1`
/// bits long; `codes` is parallel to `symbols`.
pub struct HuffmanTable {
    offsets: [usize; 17],
    symbols: Vec<u8>,
    codes: Vec<u32>,
}

impl HuffmanTable {
    /// Build a table from JPEG-style counts and symbols.
    ///
    /// `counts[i]` is the number of codes of length i+1; `symbols` lists the
    /// symbol values in order of increasing code length.
    pub fn build(counts: &[u8; 16], symbols: Vec<u8>) -> Result<Self> {
        let mut offsets = [0usize; 17];
        let mut total = 0usize;
        for (i, &count) in counts.iter().enumerate() {
            total += count as usize;
            offsets[i + 1] = total;
        }
        if total > MAX_SYMBOLS {
            return Err(JpegError::InvalidSegment("too many symbols in Huffman table"));
        }
        if total != symbols.len() {
            return Err(JpegError::InvalidSegment("DHT symbol count mismatch"));
        }

        // Generate canonical Huffman codes per ITU-T T.81 Annex C.
        let mut codes = vec![0u32; total];
        let mut code = 0u32;
        for i in 0..16 {
            for slot in &mut codes[offsets[i]..offsets[i + 1]] {
                *slot = code;
                code += 1;
            }
            code <<= 1;
        }

        Ok(Self {
            offsets,
            symbols,
            codes,
        })
    }

    /// Decode one symbol by reading bits until the accumulated code matches
    /// a code of that length. No baseline code is longer than 16 bits, so
    /// running out of lengths means the stream is corrupt.
    pub fn decode_symbol(&self, reader: &mut BitReader) -> Result<u8> {
        let mut current = 0u32;
        for i in 0..16 {
            current = (current << 1) | reader.read_bit()?;
            for j in self.offsets[i]..self.offsets[i + 1] {
                if self.codes[j] == current {
                    return Ok(self.symbols[j]);
                }
            }
        }
        Err(JpegError::InvalidEntropy("no Huffman code matched in 16 bits"))
    }

    #[cfg(test)]
    fn code_lengths(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        (0..16).flat_map(move |i| {
            self.codes[self.offsets[i]..self.offsets[i + 1]]
                .iter()
                .map(move |&c| (c, i + 1))
        })
    }
}

/// Extend a value read from the bit stream into a signed coefficient.
///
/// Per ITU-T T.81 Table F.1: a value with its high bit clear encodes a
/// negative coefficient.
pub fn extend_sign(value: u32, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }
    let value = value as i32;
    if value < 1 << (size - 1) {
        value - (1 << size) + 1
    } else {
        value
    }
}
