// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Quantization and Huffman table segment parsing.
//!
//! Handles DQT (Define Quantization Table) and DHT (Define Huffman Table)
//! marker segment payloads. Both segment kinds may carry multiple tables and
//! must consume their declared length exactly.

use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::huffman::HuffmanTable;
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Parse a DQT segment body (after the 2-byte length).
///
/// Returns (table_id, table) pairs. Values arrive in zigzag order and are
/// stored at their natural positions; precision 1 means big-endian 16-bit
/// values.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let table_info = data[pos];
        pos += 1;
        let precision = table_info >> 4;
        let table_id = table_info & 0x0F;

        if table_id > 3 {
            return Err(JpegError::InvalidSegment("quantization table ID out of range"));
        }

        let mut values = [0u16; 64];
        match precision {
            0 => {
                if pos + 64 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for zi in 0..64 {
                    values[ZIGZAG_TO_NATURAL[zi]] = u16::from(data[pos + zi]);
                }
                pos += 64;
            }
            1 => {
                if pos + 128 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for zi in 0..64 {
                    values[ZIGZAG_TO_NATURAL[zi]] =
                        u16::from_be_bytes([data[pos + zi * 2], data[pos + zi * 2 + 1]]);
                }
                pos += 128;
            }
            _ => return Err(JpegError::InvalidSegment("invalid DQT precision")),
        }

        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// Parse a DHT segment body (after the 2-byte length).
///
/// Returns (is_ac, table_id, table) triples with the canonical codes already
/// derived.
pub fn parse_dht(data: &[u8]) -> Result<Vec<(bool, u8, HuffmanTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let table_info = data[pos];
        pos += 1;
        let class = table_info >> 4;
        let table_id = table_info & 0x0F;

        if class > 1 {
            return Err(JpegError::InvalidSegment("invalid Huffman table class"));
        }
        if table_id > 3 {
            return Err(JpegError::InvalidSegment("Huffman table ID out of range"));
        }

        if pos + 16 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let mut counts = [0u8; 16];
        counts.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
        if pos + total > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let symbols = data[pos..pos + total].to_vec();
        pos += total;

        tables.push((class == 1, table_id, HuffmanTable::build(&counts, symbols)?));
    }

    Ok(tables)
}
