// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! JPEG marker parsing.
//!
//! Walks the marker segments of a JPEG byte stream from SOI to SOS, filling
//! a [`FrameHeader`], then extracts the byte-unstuffed entropy-coded scan
//! data up to EOI. Unsupported frame types and misplaced markers are
//! rejected here, before any entropy decoding starts.

use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::tables::{parse_dht, parse_dqt};

/// JPEG marker constants.
pub const TEM: u8 = 0x01;
pub const SOF0: u8 = 0xC0;
pub const DHT: u8 = 0xC4;
pub const JPG: u8 = 0xC8;
pub const DAC: u8 = 0xCC;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const DNL: u8 = 0xDC;
pub const DRI: u8 = 0xDD;
pub const DHP: u8 = 0xDE;
pub const EXP: u8 = 0xDF;
pub const APP0: u8 = 0xE0;
pub const APP15: u8 = 0xEF;
pub const JPG0: u8 = 0xF0;
pub const JPG13: u8 = 0xFD;
pub const COM: u8 = 0xFE;

/// Parse the marker stream and the entropy-coded data of a complete JPEG
/// file, producing a fully populated [`FrameHeader`].
pub fn parse(data: &[u8]) -> Result<FrameHeader> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return Err(JpegError::BadSignature);
    }

    let mut header = FrameHeader::new();
    let mut pos = 2;

    loop {
        // Every segment starts with 0xFF followed by the marker identifier;
        // any number of 0xFF fill bytes in between is allowed.
        if pos >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        if data[pos] != 0xFF {
            return Err(JpegError::BadSignature);
        }
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let marker = data[pos];
        pos += 1;

        match marker {
            SOF0 => header.read_sof(segment_body(data, &mut pos)?)?,
            DQT => {
                for (id, table) in parse_dqt(segment_body(data, &mut pos)?)? {
                    log::debug!("DQT: registered quantization table {id}");
                    header.quant_tables[id as usize] = Some(table);
                }
            }
            DHT => {
                for (is_ac, id, table) in parse_dht(segment_body(data, &mut pos)?)? {
                    log::debug!(
                        "DHT: registered {} table {id}",
                        if is_ac { "AC" } else { "DC" }
                    );
                    if is_ac {
                        header.ac_tables[id as usize] = Some(table);
                    } else {
                        header.dc_tables[id as usize] = Some(table);
                    }
                }
            }
            SOS => {
                header.read_sos(segment_body(data, &mut pos)?)?;
                break;
            }
            DRI => header.read_dri(segment_body(data, &mut pos)?)?,
            APP0..=APP15 | COM | JPG0..=JPG13 | DNL | DHP | EXP => {
                // Skipped based on length; APPn content is never interpreted.
                segment_body(data, &mut pos)?;
            }
            TEM => {} // no payload
            SOI => return Err(JpegError::Unsupported("embedded JPEG (nested SOI)")),
            EOI => return Err(JpegError::InvalidSegment("EOI before SOS")),
            RST0..=RST7 => return Err(JpegError::InvalidSegment("restart marker before SOS")),
            DAC => return Err(JpegError::Unsupported("arithmetic coding")),
            0xC1..=0xCF => return Err(JpegError::Unsupported("non-baseline frame type")),
            _ => return Err(JpegError::InvalidMarker(marker)),
        }
    }

    read_entropy_data(data, pos, &mut header)?;

    log::trace!(
        "parsed header: {}x{}, {} component(s), sampling {}x{}, restart interval {}, {} scan bytes",
        header.width,
        header.height,
        header.num_components,
        header.h_max,
        header.v_max,
        header.restart_interval,
        header.entropy_data.len(),
    );

    validate_table_references(&header)?;
    Ok(header)
}

/// Read a segment's 2-byte length (which includes itself) and return the
/// segment body, advancing the cursor past it.
fn segment_body<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    if *pos + 2 > data.len() {
        return Err(JpegError::UnexpectedEof);
    }
    let length = u16::from_be_bytes([data[*pos], data[*pos + 1]]) as usize;
    if length < 2 {
        return Err(JpegError::InvalidSegment("segment length below 2"));
    }
    if *pos + length > data.len() {
        return Err(JpegError::UnexpectedEof);
    }
    let body = &data[*pos + 2..*pos + length];
    *pos += length;
    Ok(body)
}

/// Consume the entropy-coded data following the SOS header, undoing byte
/// stuffing and eliding restart markers, until EOI.
fn read_entropy_data(data: &[u8], mut pos: usize, header: &mut FrameHeader) -> Result<()> {
    loop {
        if pos >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let byte = data[pos];
        if byte != 0xFF {
            header.entropy_data.push(byte);
            pos += 1;
            continue;
        }

        if pos + 1 >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        match data[pos + 1] {
            // Stuffed byte: a literal 0xFF followed by a discarded 0x00.
            0x00 => {
                header.entropy_data.push(0xFF);
                pos += 2;
            }
            // Restart markers carry no data; the entropy decoder
            // resynchronizes by MCU count alone.
            RST0..=RST7 => pos += 2,
            // Fill byte.
            0xFF => pos += 1,
            EOI => {
                let trailing = data.len() - pos - 2;
                if trailing > 0 {
                    log::warn!("ignoring {trailing} trailing bytes after EOI");
                }
                return Ok(());
            }
            other => return Err(JpegError::InvalidMarker(other)),
        }
    }
}

/// Every table referenced by an in-scan component must have been defined.
fn validate_table_references(header: &FrameHeader) -> Result<()> {
    for component in &header.components[..header.num_components as usize] {
        if header.quant_tables[component.quant_table_id as usize].is_none() {
            return Err(JpegError::InvalidSegment(
                "component references undefined quantization table",
            ));
        }
        if header.dc_tables[component.dc_table_id as usize].is_none() {
            return Err(JpegError::InvalidSegment(
                "component references undefined DC Huffman table",
            ));
        }
        if header.ac_tables[component.ac_table_id as usize].is_none() {
            return Err(JpegError::InvalidSegment(
                "component references undefined AC Huffman table",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&(body.len() as u16 + 2).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    /// Minimal 8x8 grayscale JPEG: all-ones DQT, single-symbol Huffman
    /// tables, one block of scan data (DC diff 0, immediate EOB).
    fn tiny_grayscale() -> Vec<u8> {
        let mut jpg = vec![0xFF, SOI];
        let mut dqt = vec![0x00];
        dqt.extend_from_slice(&[1; 64]);
        jpg.extend(segment(DQT, &dqt));
        jpg.extend(segment(SOF0, &[8, 0, 8, 0, 8, 1, 1, 0x11, 0]));
        let mut dht_dc = vec![0x00, 1];
        dht_dc.extend_from_slice(&[0; 15]);
        dht_dc.push(0x00);
        jpg.extend(segment(DHT, &dht_dc));
        let mut dht_ac = vec![0x10, 1];
        dht_ac.extend_from_slice(&[0; 15]);
        dht_ac.push(0x00);
        jpg.extend(segment(DHT, &dht_ac));
        jpg.extend(segment(SOS, &[1, 1, 0x00, 0, 63, 0]));
        jpg.push(0x3F); // DC code (1 bit) + EOB code (1 bit), 1-padded
        jpg.extend_from_slice(&[0xFF, EOI]);
        jpg
    }

    #[test]
    fn parse_minimal_file() {
        let header = parse(&tiny_grayscale()).unwrap();
        assert_eq!(header.width, 8);
        assert_eq!(header.height, 8);
        assert_eq!(header.num_components, 1);
        assert_eq!(header.entropy_data, vec![0x3F]);
        assert!(header.quant_tables[0].is_some());
    }

    #[test]
    fn missing_soi() {
        assert!(matches!(
            parse(&[0x00, 0x11, 0x22]),
            Err(JpegError::BadSignature)
        ));
    }

    #[test]
    fn fill_bytes_before_marker_are_skipped() {
        let mut jpg = tiny_grayscale();
        // Insert extra 0xFF fill bytes before the DQT marker.
        jpg.splice(2..2, [0xFF, 0xFF, 0xFF]);
        assert!(parse(&jpg).is_ok());
    }

    #[test]
    fn stray_byte_where_marker_expected() {
        let mut jpg = tiny_grayscale();
        jpg.insert(2, 0x42);
        assert!(matches!(parse(&jpg), Err(JpegError::BadSignature)));
    }

    #[test]
    fn eoi_before_sos() {
        let jpg = [0xFF, SOI, 0xFF, EOI];
        assert!(matches!(parse(&jpg), Err(JpegError::InvalidSegment(_))));
    }

    #[test]
    fn restart_marker_before_sos() {
        let jpg = [0xFF, SOI, 0xFF, RST0];
        assert!(matches!(parse(&jpg), Err(JpegError::InvalidSegment(_))));
    }

    #[test]
    fn nested_soi() {
        let jpg = [0xFF, SOI, 0xFF, SOI];
        assert!(matches!(parse(&jpg), Err(JpegError::Unsupported(_))));
    }

    #[test]
    fn arithmetic_coding_rejected() {
        let mut jpg = vec![0xFF, SOI];
        jpg.extend(segment(DAC, &[0, 0]));
        assert!(matches!(
            parse(&jpg),
            Err(JpegError::Unsupported("arithmetic coding"))
        ));
    }

    #[test]
    fn progressive_rejected() {
        let mut jpg = vec![0xFF, SOI];
        jpg.extend(segment(0xC2, &[8, 0, 8, 0, 8, 1, 1, 0x11, 0]));
        assert!(matches!(parse(&jpg), Err(JpegError::Unsupported(_))));
    }

    #[test]
    fn unknown_marker() {
        let jpg = [0xFF, SOI, 0xFF, 0x10];
        assert!(matches!(parse(&jpg), Err(JpegError::InvalidMarker(0x10))));
    }

    #[test]
    fn app_and_com_segments_are_skipped() {
        let mut jpg = tiny_grayscale();
        let app0 = segment(APP0, b"JFIF\0rest-is-ignored");
        let com = segment(COM, b"a comment");
        jpg.splice(2..2, app0.into_iter().chain(com));
        assert!(parse(&jpg).is_ok());
    }

    #[test]
    fn truncated_segment() {
        let mut jpg = vec![0xFF, SOI, 0xFF, DQT, 0x00, 0x43]; // claims 65 bytes of body
        jpg.push(0x00);
        assert!(matches!(parse(&jpg), Err(JpegError::UnexpectedEof)));
    }

    #[test]
    fn undefined_table_reference() {
        // Valid structure, but no DQT segment at all.
        let mut jpg = vec![0xFF, SOI];
        jpg.extend(segment(SOF0, &[8, 0, 8, 0, 8, 1, 1, 0x11, 0]));
        let mut dht_dc = vec![0x00, 1];
        dht_dc.extend_from_slice(&[0; 15]);
        dht_dc.push(0x00);
        jpg.extend(segment(DHT, &dht_dc));
        let mut dht_ac = vec![0x10, 1];
        dht_ac.extend_from_slice(&[0; 15]);
        dht_ac.push(0x00);
        jpg.extend(segment(DHT, &dht_ac));
        jpg.extend(segment(SOS, &[1, 1, 0x00, 0, 63, 0]));
        jpg.push(0x3F);
        jpg.extend_from_slice(&[0xFF, EOI]);
        assert!(matches!(
            parse(&jpg),
            Err(JpegError::InvalidSegment("component references undefined quantization table"))
        ));
    }

    #[test]
    fn entropy_unstuffing() {
        let mut jpg = tiny_grayscale();
        // Replace the scan byte with: literal 0xFF (stuffed), a restart
        // marker (elided), a fill byte run, then a plain byte.
        let sos_end = jpg.len() - 3;
        jpg.splice(
            sos_end..sos_end + 1,
            [0xFF, 0x00, 0xFF, RST0, 0xFF, 0xFF, 0xD1, 0xAB],
        );
        // The parser does not entropy-decode, so the nonsense payload only
        // needs to unstuff correctly.
        let header = parse(&jpg).unwrap();
        assert_eq!(header.entropy_data, vec![0xFF, 0xAB]);
    }

    #[test]
    fn bad_marker_inside_scan() {
        let mut jpg = tiny_grayscale();
        let sos_end = jpg.len() - 3;
        jpg.splice(sos_end..sos_end, [0xFF, 0x77]);
        assert!(matches!(parse(&jpg), Err(JpegError::InvalidMarker(0x77))));
    }

    #[test]
    fn truncated_scan() {
        let mut jpg = tiny_grayscale();
        jpg.truncate(jpg.len() - 2); // drop the EOI
        assert!(matches!(parse(&jpg), Err(JpegError::UnexpectedEof)));
    }
}
