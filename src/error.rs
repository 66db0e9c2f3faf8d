// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Error types for JPEG decoding.

use std::fmt;

/// Errors that can occur while decoding a JPEG file.
///
/// Every error is fatal to the decode in progress; there is no recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// Input data ended mid-segment or mid-scan.
    UnexpectedEof,
    /// Missing SOI at the start of the data, or stray bytes where a marker
    /// was expected.
    BadSignature,
    /// The file uses a JPEG feature outside the baseline subset (progressive,
    /// arithmetic coding, 12-bit precision, CMYK/YIQ, ...).
    Unsupported(&'static str),
    /// A marker segment has inconsistent length or invalid content.
    InvalidSegment(&'static str),
    /// The entropy-coded scan data is corrupt (unmatched Huffman code,
    /// out-of-range coefficient size, bit reader underflow, ...).
    InvalidEntropy(&'static str),
    /// An unknown marker byte, or a marker that is not allowed where it
    /// appeared.
    InvalidMarker(u8),
}

impl fmt::Display for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of JPEG data"),
            Self::BadSignature => write!(f, "missing SOI marker (not a JPEG)"),
            Self::Unsupported(msg) => write!(f, "unsupported JPEG feature: {msg}"),
            Self::InvalidSegment(msg) => write!(f, "invalid marker segment: {msg}"),
            Self::InvalidEntropy(msg) => write!(f, "corrupt scan data: {msg}"),
            Self::InvalidMarker(m) => write!(f, "invalid marker: 0xFF{m:02X}"),
        }
    }
}

impl std::error::Error for JpegError {}

pub type Result<T> = std::result::Result<T, JpegError>;
