// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Entropy decoding of the scan data.
//!
//! Decodes the unstuffed entropy-coded byte sequence into one [`BlockGrid`]
//! per component: Huffman-coded DC differences with per-component
//! prediction, run-length coded AC coefficients placed in zigzag order, and
//! restart-interval resynchronization (DC reset + byte align) driven purely
//! by MCU count, since restart markers were elided during unstuffing.

use super::bitio::BitReader;
use super::dct::BlockGrid;
use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::huffman::{extend_sign, HuffmanTable};
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Decode the whole scan into per-component coefficient grids.
///
/// Blocks appear in the stream in MCU order, components in frame order, and
/// sub-blocks of a component row-major within the MCU. Every grid is
/// allocated at the real (rounded) block dimensions; components with 1x1
/// sampling only populate their MCU anchor positions.
pub fn decode_scan(header: &FrameHeader) -> Result<Vec<BlockGrid>> {
    let num_components = header.num_components as usize;

    let mut grids: Vec<BlockGrid> = (0..num_components)
        .map(|_| BlockGrid::new(header.block_width_real, header.block_height_real))
        .collect();

    // Resolve the table selectors once; the marker parser already verified
    // that every referenced table exists.
    let mut dc_tables: Vec<&HuffmanTable> = Vec::with_capacity(num_components);
    let mut ac_tables: Vec<&HuffmanTable> = Vec::with_capacity(num_components);
    for component in &header.components[..num_components] {
        dc_tables.push(
            header.dc_tables[component.dc_table_id as usize]
                .as_ref()
                .ok_or(JpegError::InvalidSegment("component references undefined DC Huffman table"))?,
        );
        ac_tables.push(
            header.ac_tables[component.ac_table_id as usize]
                .as_ref()
                .ok_or(JpegError::InvalidSegment("component references undefined AC Huffman table"))?,
        );
    }

    let mut reader = BitReader::new(&header.entropy_data);
    let mut dc_pred = [0i32; 3];
    let restart_interval = header.restart_interval as usize;
    let mut mcu_index = 0usize;

    for y in (0..header.block_height).step_by(header.v_max as usize) {
        for x in (0..header.block_width).step_by(header.h_max as usize) {
            if restart_interval != 0 && mcu_index > 0 && mcu_index % restart_interval == 0 {
                dc_pred = [0; 3];
                reader.align();
            }

            for (i, component) in header.components[..num_components].iter().enumerate() {
                for v in 0..component.v_sampling as usize {
                    for h in 0..component.h_sampling as usize {
                        let block = grids[i].block_mut(y + v, x + h);
                        decode_block(&mut reader, block, &mut dc_pred[i], dc_tables[i], ac_tables[i])?;
                    }
                }
            }

            mcu_index += 1;
        }
    }

    Ok(grids)
}

/// Decode the 64 coefficients of one block, stored into natural order.
fn decode_block(
    reader: &mut BitReader,
    block: &mut [i32],
    dc_pred: &mut i32,
    dc_table: &HuffmanTable,
    ac_table: &HuffmanTable,
) -> Result<()> {
    // The DC symbol is the bit length of the DC difference.
    let dc_size = dc_table.decode_symbol(reader)?;
    if dc_size > 11 {
        return Err(JpegError::InvalidEntropy("DC coefficient size exceeds 11"));
    }
    let dc_diff = extend_sign(reader.read_bits(dc_size)?, dc_size);
    *dc_pred += dc_diff;
    block[0] = *dc_pred;

    // AC symbols pack a zero-run length and the coefficient bit length.
    let mut i = 1;
    while i < 64 {
        let symbol = ac_table.decode_symbol(reader)?;
        if symbol == 0x00 {
            // EOB: the rest of the block stays zero.
            return Ok(());
        }

        // ZRL (0xF0) is a run of 16 zeros with no coefficient.
        let num_zeroes = if symbol == 0xF0 {
            16
        } else {
            usize::from(symbol >> 4)
        };
        let ac_size = symbol & 0x0F;

        if i + num_zeroes >= 64 {
            return Err(JpegError::InvalidEntropy("zero run-length exceeds block"));
        }
        i += num_zeroes;

        if ac_size > 10 {
            return Err(JpegError::InvalidEntropy("AC coefficient size exceeds 10"));
        }
        if ac_size != 0 {
            block[ZIGZAG_TO_NATURAL[i]] = extend_sign(reader.read_bits(ac_size)?, ac_size);
            i += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// DC table: symbols 0..=3 as 2-bit codes 00, 01, 10 and 3-bit code 110.
    fn small_dc_table() -> HuffmanTable {
        let mut counts = [0u8; 16];
        counts[1] = 3;
        counts[2] = 1;
        HuffmanTable::build(&counts, vec![0, 1, 2, 3]).unwrap()
    }

    /// AC table: EOB (0x00) = 00, 0x01 = 01, 0x11 = 10, ZRL (0xF0) = 110.
    fn small_ac_table() -> HuffmanTable {
        let mut counts = [0u8; 16];
        counts[1] = 3;
        counts[2] = 1;
        HuffmanTable::build(&counts, vec![0x00, 0x01, 0x11, 0xF0]).unwrap()
    }

    #[test]
    fn dc_difference_and_eob() {
        let dc = small_dc_table();
        let ac = small_ac_table();
        // DC symbol 2 (code 10), diff bits 11 → +3; EOB (code 00).
        let data = [0b10_11_00_00];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 5;
        decode_block(&mut reader, &mut block, &mut pred, &dc, &ac).unwrap();
        assert_eq!(block[0], 8); // 5 + 3
        assert_eq!(pred, 8);
        assert!(block[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn negative_dc_difference() {
        let dc = small_dc_table();
        let ac = small_ac_table();
        // DC symbol 2 (code 10), diff bits 00 → -3; EOB.
        let data = [0b10_00_00_00];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 0;
        decode_block(&mut reader, &mut block, &mut pred, &dc, &ac).unwrap();
        assert_eq!(block[0], -3);
    }

    #[test]
    fn ac_run_length_places_in_zigzag_order() {
        let dc = small_dc_table();
        let ac = small_ac_table();
        // DC symbol 0 (code 00): diff 0.
        // AC symbol 0x11 (code 10): skip 1 zero, 1-bit coefficient 1 → +1
        //   at zigzag position 2 (natural 8).
        // EOB (code 00).
        let data = [0b00_10_1_00_0];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 0;
        decode_block(&mut reader, &mut block, &mut pred, &dc, &ac).unwrap();
        assert_eq!(block[8], 1);
        assert_eq!(block[0], 0);
        assert_eq!(block[1], 0);
    }

    #[test]
    fn zrl_skips_sixteen() {
        let dc = small_dc_table();
        let ac = small_ac_table();
        // DC 0; ZRL (code 110); AC 0x01 (code 01) with bit 1 → +1 at
        // zigzag 17 (1 + 16); EOB.
        let data = [0b00_110_01_1, 0b00_000000];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 0;
        decode_block(&mut reader, &mut block, &mut pred, &dc, &ac).unwrap();
        assert_eq!(block[ZIGZAG_TO_NATURAL[17]], 1);
        assert_eq!(block.iter().filter(|&&c| c != 0).count(), 1);
    }

    #[test]
    fn overlong_zero_run_is_rejected() {
        let dc = small_dc_table();
        // AC table where 0xF0 is cheap: decode four ZRLs → 1 + 64 ≥ 64.
        let ac = small_ac_table();
        let data = [0b00_110_110, 0b110_110_00];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 0;
        let result = decode_block(&mut reader, &mut block, &mut pred, &dc, &ac);
        assert!(matches!(result, Err(JpegError::InvalidEntropy(_))));
    }

    #[test]
    fn dc_size_over_11_is_rejected() {
        let mut counts = [0u8; 16];
        counts[0] = 1;
        let dc = HuffmanTable::build(&counts, vec![12]).unwrap();
        let ac = small_ac_table();
        let data = [0x00, 0x00];
        let mut reader = BitReader::new(&data);
        let mut block = [0i32; 64];
        let mut pred = 0;
        assert!(matches!(
            decode_block(&mut reader, &mut block, &mut pred, &dc, &ac),
            Err(JpegError::InvalidEntropy("DC coefficient size exceeds 11"))
        ));
    }
}
