// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Frame state assembled from the marker stream.
//!
//! [`FrameHeader`] accumulates everything the pipeline needs: dimensions and
//! per-component sampling from SOF0, entropy table selectors from SOS, the
//! restart interval from DRI, the parsed quantization and Huffman tables,
//! and the unstuffed entropy-coded byte sequence.

use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::huffman::HuffmanTable;

/// Per-component state, indexed by component ID - 1.
#[derive(Debug, Clone)]
pub struct ColorComponent {
    /// Horizontal sampling factor (1 or 2; 2 only on luma).
    pub h_sampling: u8,
    /// Vertical sampling factor (1 or 2; 2 only on luma).
    pub v_sampling: u8,
    /// Quantization table selector (0–3).
    pub quant_table_id: u8,
    /// DC Huffman table selector (0–3), from SOS.
    pub dc_table_id: u8,
    /// AC Huffman table selector (0–3), from SOS.
    pub ac_table_id: u8,
    /// Declared by the SOF segment.
    pub in_frame: bool,
    /// Selected by the SOS segment.
    pub in_scan: bool,
}

impl Default for ColorComponent {
    fn default() -> Self {
        Self {
            h_sampling: 1,
            v_sampling: 1,
            quant_table_id: 0,
            dc_table_id: 0,
            ac_table_id: 0,
            in_frame: false,
            in_scan: false,
        }
    }
}

/// Whole-image state built incrementally by the marker parser.
#[derive(Default)]
pub struct FrameHeader {
    pub width: u16,
    pub height: u16,
    /// 1 (grayscale) or 3 (YCbCr). Zero until SOF is read.
    pub num_components: u8,
    /// Component IDs in the stream were 0-based (0,1,2) and have been
    /// shifted to 1-based for the rest of the decode.
    pub zero_based: bool,
    /// Luma horizontal sampling factor; blocks per MCU on the x axis.
    pub h_max: u8,
    /// Luma vertical sampling factor; blocks per MCU on the y axis.
    pub v_max: u8,
    /// MCUs between restart points; 0 = no restarts.
    pub restart_interval: u16,

    /// ceil(width / 8) and ceil(height / 8).
    pub block_width: usize,
    pub block_height: usize,
    /// Block dims rounded up to even where the luma sampling factor is 2,
    /// so every MCU has a full complement of backing blocks.
    pub block_width_real: usize,
    pub block_height_real: usize,

    pub start_of_selection: u8,
    pub end_of_selection: u8,
    pub successive_approx_high: u8,
    pub successive_approx_low: u8,

    pub components: [ColorComponent; 3],
    pub quant_tables: [Option<QuantTable>; 4],
    pub dc_tables: [Option<HuffmanTable>; 4],
    pub ac_tables: [Option<HuffmanTable>; 4],

    /// Byte-unstuffed entropy-coded scan data (restart markers elided).
    pub entropy_data: Vec<u8>,
}

impl FrameHeader {
    pub fn new() -> Self {
        Self {
            h_max: 1,
            v_max: 1,
            end_of_selection: 63,
            ..Self::default()
        }
    }

    /// Parse an SOF0 segment body (after the 2-byte length).
    pub fn read_sof(&mut self, data: &[u8]) -> Result<()> {
        if self.num_components != 0 {
            return Err(JpegError::InvalidSegment("multiple SOF segments"));
        }
        if data.len() < 6 {
            return Err(JpegError::InvalidSegment("SOF segment truncated"));
        }

        let precision = data[0];
        if precision != 8 {
            return Err(JpegError::Unsupported("sample precision other than 8 bits"));
        }

        self.height = u16::from_be_bytes([data[1], data[2]]);
        self.width = u16::from_be_bytes([data[3], data[4]]);
        if self.height == 0 || self.width == 0 {
            return Err(JpegError::InvalidSegment("zero image dimensions"));
        }
        self.block_width = (self.width as usize + 7) / 8;
        self.block_height = (self.height as usize + 7) / 8;
        self.block_width_real = self.block_width;
        self.block_height_real = self.block_height;

        let num_components = data[5];
        match num_components {
            1 | 3 => {}
            4 => return Err(JpegError::Unsupported("four-component (CMYK) color mode")),
            _ => return Err(JpegError::Unsupported("component count must be 1 or 3")),
        }
        if data.len() != 6 + 3 * num_components as usize {
            return Err(JpegError::InvalidSegment("SOF length mismatch"));
        }

        for i in 0..num_components as usize {
            let offset = 6 + 3 * i;

            // Component IDs are usually 1, 2, 3 but are occasionally 0, 1, 2;
            // force them to 1-based for the rest of the decode.
            if i == 0 && data[offset] == 0 {
                self.zero_based = true;
            }
            let mut id = u16::from(data[offset]);
            if self.zero_based {
                id += 1;
            }
            if id == 4 || id == 5 {
                return Err(JpegError::Unsupported("YIQ color mode"));
            }
            if id == 0 || id > 3 {
                return Err(JpegError::InvalidSegment("invalid component ID"));
            }

            let sampling = data[offset + 1];
            let h_sampling = sampling >> 4;
            let v_sampling = sampling & 0x0F;
            if id == 1 {
                if !matches!(h_sampling, 1 | 2) || !matches!(v_sampling, 1 | 2) {
                    return Err(JpegError::Unsupported("luma sampling factors"));
                }
                if h_sampling == 2 && self.block_width % 2 == 1 {
                    self.block_width_real += 1;
                }
                if v_sampling == 2 && self.block_height % 2 == 1 {
                    self.block_height_real += 1;
                }
                self.h_max = h_sampling;
                self.v_max = v_sampling;
            } else if h_sampling != 1 || v_sampling != 1 {
                return Err(JpegError::Unsupported("chroma sampling factors"));
            }

            let quant_table_id = data[offset + 2];
            if quant_table_id > 3 {
                return Err(JpegError::InvalidSegment("quantization table selector out of range"));
            }

            let component = &mut self.components[id as usize - 1];
            if component.in_frame {
                return Err(JpegError::InvalidSegment("duplicate component ID"));
            }
            component.in_frame = true;
            component.h_sampling = h_sampling;
            component.v_sampling = v_sampling;
            component.quant_table_id = quant_table_id;
        }

        self.num_components = num_components;
        Ok(())
    }

    /// Parse an SOS segment body (after the 2-byte length).
    pub fn read_sos(&mut self, data: &[u8]) -> Result<()> {
        if self.num_components == 0 {
            return Err(JpegError::InvalidSegment("SOS before SOF"));
        }
        if data.is_empty() {
            return Err(JpegError::InvalidSegment("SOS segment truncated"));
        }

        let scan_components = data[0] as usize;
        if data.len() != 1 + 2 * scan_components + 3 {
            return Err(JpegError::InvalidSegment("SOS length mismatch"));
        }

        for component in &mut self.components {
            component.in_scan = false;
        }

        for i in 0..scan_components {
            let mut id = u16::from(data[1 + 2 * i]);
            if self.zero_based {
                id += 1;
            }
            if id == 0 || id > u16::from(self.num_components) {
                return Err(JpegError::InvalidSegment("invalid scan component ID"));
            }

            let table_ids = data[2 + 2 * i];
            let dc_table_id = table_ids >> 4;
            let ac_table_id = table_ids & 0x0F;
            if dc_table_id > 3 {
                return Err(JpegError::InvalidSegment("DC table selector out of range"));
            }
            if ac_table_id > 3 {
                return Err(JpegError::InvalidSegment("AC table selector out of range"));
            }

            let component = &mut self.components[id as usize - 1];
            if !component.in_frame {
                return Err(JpegError::InvalidSegment("scan component not declared in frame"));
            }
            if component.in_scan {
                return Err(JpegError::InvalidSegment("duplicate scan component ID"));
            }
            component.in_scan = true;
            component.dc_table_id = dc_table_id;
            component.ac_table_id = ac_table_id;
        }

        // Baseline images carry all components in one interleaved scan.
        if self.components[..self.num_components as usize]
            .iter()
            .any(|c| !c.in_scan)
        {
            return Err(JpegError::Unsupported("image data split across multiple scans"));
        }

        let base = 1 + 2 * scan_components;
        self.start_of_selection = data[base];
        self.end_of_selection = data[base + 1];
        self.successive_approx_high = data[base + 2] >> 4;
        self.successive_approx_low = data[base + 2] & 0x0F;

        if self.start_of_selection != 0 || self.end_of_selection != 63 {
            return Err(JpegError::Unsupported("spectral selection"));
        }
        if self.successive_approx_high != 0 || self.successive_approx_low != 0 {
            return Err(JpegError::Unsupported("successive approximation"));
        }

        Ok(())
    }

    /// Parse a DRI segment body (after the 2-byte length).
    pub fn read_dri(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != 2 {
            return Err(JpegError::InvalidSegment("DRI length mismatch"));
        }
        self.restart_interval = u16::from_be_bytes([data[0], data[1]]);
        Ok(())
    }
}
