//! Incremental image metadata sniffing
//!
//! Determines image format and pixel dimensions from a byte prefix so
//! candidates can be measured for a few hundred bytes instead of a full
//! download. The sniffer is a push parser: feed it chunks as they arrive
//! and stop reading the moment it concludes.
//!
//! Format detection is a magic-byte table; dimension extraction is
//! format-specific. PNG/GIF/BMP/WebP have fixed-offset header fields,
//! JPEG requires walking variable-length marker segments until a
//! Start-Of-Frame marker appears.

use crate::cover::CoverImageFormat;
use crate::error::SniffError;

/// Hard cap on buffered bytes before giving up on a stream
pub const DEFAULT_SNIFF_CAP: usize = 32 * 1024;

/// Longest prefix needed to discriminate all known signatures
/// (RIFF????WEBP is 12 bytes)
const MAGIC_PREFIX_LEN: usize = 12;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
const WEBP_VP8_SYNC: [u8; 3] = [0x9D, 0x01, 0x2A];

/// Successful sniff outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedImage {
    pub format: CoverImageFormat,
    pub width: u32,
    pub height: u32,
}

enum Step {
    Done(SniffedImage),
    NeedMore,
}

/// Incremental sniffer over a growing byte prefix
///
/// `push` chunks until it returns `Ok(Some(_))`; if the stream ends
/// first, `finish` yields the terminal error for the candidate.
pub struct MetadataSniffer {
    buf: Vec<u8>,
    cap: usize,
}

impl MetadataSniffer {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_SNIFF_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            buf: Vec::new(),
            cap,
        }
    }

    /// Bytes buffered so far
    pub fn bytes_buffered(&self) -> usize {
        self.buf.len()
    }

    /// Feed the next chunk
    ///
    /// Returns `Ok(Some(_))` once format and dimensions are known,
    /// `Ok(None)` when more bytes are needed, and
    /// `Err(SniffError::UnrecognizedFormat)` when the prefix matches no
    /// known signature or the buffer cap is reached without a conclusion.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<SniffedImage>, SniffError> {
        self.buf.extend_from_slice(chunk);

        match try_sniff(&self.buf)? {
            Step::Done(img) => {
                if img.width == 0 || img.height == 0 {
                    return Err(SniffError::UnrecognizedFormat);
                }
                Ok(Some(img))
            }
            Step::NeedMore => {
                if self.buf.len() >= self.cap {
                    Err(SniffError::UnrecognizedFormat)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// The stream ended without a conclusion
    pub fn finish(self) -> SniffError {
        SniffError::TruncatedStream
    }
}

impl Default for MetadataSniffer {
    fn default() -> Self {
        Self::new()
    }
}

fn try_sniff(buf: &[u8]) -> Result<Step, SniffError> {
    if buf.len() < MAGIC_PREFIX_LEN {
        return Ok(Step::NeedMore);
    }

    match detect_format(buf) {
        Some(CoverImageFormat::Png) => parse_png(buf),
        Some(CoverImageFormat::Jpeg) => parse_jpeg(buf),
        Some(CoverImageFormat::Gif) => parse_gif(buf),
        Some(CoverImageFormat::Bmp) => parse_bmp(buf),
        Some(CoverImageFormat::Webp) => parse_webp(buf),
        None => Err(SniffError::UnrecognizedFormat),
    }
}

/// Magic-byte table; `buf` holds at least `MAGIC_PREFIX_LEN` bytes
fn detect_format(buf: &[u8]) -> Option<CoverImageFormat> {
    if buf.starts_with(&PNG_SIGNATURE) {
        Some(CoverImageFormat::Png)
    } else if buf.starts_with(&JPEG_SOI) {
        Some(CoverImageFormat::Jpeg)
    } else if buf.starts_with(b"GIF87a") || buf.starts_with(b"GIF89a") {
        Some(CoverImageFormat::Gif)
    } else if buf.starts_with(b"BM") {
        Some(CoverImageFormat::Bmp)
    } else if buf.starts_with(b"RIFF") && &buf[8..12] == b"WEBP" {
        Some(CoverImageFormat::Webp)
    } else {
        None
    }
}

fn be_u16(buf: &[u8], at: usize) -> u32 {
    u32::from(u16::from_be_bytes([buf[at], buf[at + 1]]))
}

fn le_u16(buf: &[u8], at: usize) -> u32 {
    u32::from(u16::from_le_bytes([buf[at], buf[at + 1]]))
}

fn le_u24(buf: &[u8], at: usize) -> u32 {
    u32::from(buf[at]) | u32::from(buf[at + 1]) << 8 | u32::from(buf[at + 2]) << 16
}

/// IHDR width/height at fixed offsets right after the 8-byte signature
/// and the 4-byte chunk length
fn parse_png(buf: &[u8]) -> Result<Step, SniffError> {
    if buf.len() < 24 {
        return Ok(Step::NeedMore);
    }
    if &buf[12..16] != b"IHDR" {
        return Err(SniffError::UnrecognizedFormat);
    }
    Ok(Step::Done(SniffedImage {
        format: CoverImageFormat::Png,
        width: u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]),
        height: u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]),
    }))
}

/// Logical screen descriptor, little-endian
fn parse_gif(buf: &[u8]) -> Result<Step, SniffError> {
    if buf.len() < 10 {
        return Ok(Step::NeedMore);
    }
    Ok(Step::Done(SniffedImage {
        format: CoverImageFormat::Gif,
        width: le_u16(buf, 6),
        height: le_u16(buf, 8),
    }))
}

/// BITMAPINFOHEADER (or the legacy 12-byte core header), little-endian
fn parse_bmp(buf: &[u8]) -> Result<Step, SniffError> {
    if buf.len() < 18 {
        return Ok(Step::NeedMore);
    }
    let header_size = u32::from_le_bytes([buf[14], buf[15], buf[16], buf[17]]);
    if header_size == 12 {
        // BITMAPCOREHEADER: u16 dimensions
        if buf.len() < 22 {
            return Ok(Step::NeedMore);
        }
        return Ok(Step::Done(SniffedImage {
            format: CoverImageFormat::Bmp,
            width: le_u16(buf, 18),
            height: le_u16(buf, 20),
        }));
    }
    if buf.len() < 26 {
        return Ok(Step::NeedMore);
    }
    // Height may be negative for top-down bitmaps
    let width = i32::from_le_bytes([buf[18], buf[19], buf[20], buf[21]]);
    let height = i32::from_le_bytes([buf[22], buf[23], buf[24], buf[25]]);
    Ok(Step::Done(SniffedImage {
        format: CoverImageFormat::Bmp,
        width: width.unsigned_abs(),
        height: height.unsigned_abs(),
    }))
}

/// RIFF container: the first chunk after the WEBP fourcc decides the
/// flavor (lossy VP8, lossless VP8L, or extended VP8X)
fn parse_webp(buf: &[u8]) -> Result<Step, SniffError> {
    if buf.len() < 16 {
        return Ok(Step::NeedMore);
    }
    match &buf[12..16] {
        b"VP8 " => {
            if buf.len() < 30 {
                return Ok(Step::NeedMore);
            }
            if buf[23..26] != WEBP_VP8_SYNC {
                return Err(SniffError::UnrecognizedFormat);
            }
            Ok(Step::Done(SniffedImage {
                format: CoverImageFormat::Webp,
                width: le_u16(buf, 26) & 0x3FFF,
                height: le_u16(buf, 28) & 0x3FFF,
            }))
        }
        b"VP8L" => {
            if buf.len() < 25 {
                return Ok(Step::NeedMore);
            }
            if buf[20] != 0x2F {
                return Err(SniffError::UnrecognizedFormat);
            }
            // 14-bit width and height, minus one, packed little-endian
            let b = [buf[21], buf[22], buf[23], buf[24]];
            let width = 1 + (u32::from(b[0]) | (u32::from(b[1]) & 0x3F) << 8);
            let height = 1
                + (u32::from(b[1]) >> 6
                    | u32::from(b[2]) << 2
                    | (u32::from(b[3]) & 0x0F) << 10);
            Ok(Step::Done(SniffedImage {
                format: CoverImageFormat::Webp,
                width,
                height,
            }))
        }
        b"VP8X" => {
            if buf.len() < 30 {
                return Ok(Step::NeedMore);
            }
            Ok(Step::Done(SniffedImage {
                format: CoverImageFormat::Webp,
                width: 1 + le_u24(buf, 24),
                height: 1 + le_u24(buf, 27),
            }))
        }
        _ => Err(SniffError::UnrecognizedFormat),
    }
}

/// SOF markers that carry frame dimensions: C0-C3, C5-C7, C9-CB, CD-CF
/// (C4 is DHT, C8 is JPG, CC is DAC)
fn is_dimension_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

/// Walk marker segments from just past SOI until a Start-Of-Frame marker
/// appears, skipping APPn/COM/DQT/... via their big-endian length fields
fn parse_jpeg(buf: &[u8]) -> Result<Step, SniffError> {
    let mut pos = 2;
    loop {
        if pos >= buf.len() {
            return Ok(Step::NeedMore);
        }
        if buf[pos] != 0xFF {
            return Err(SniffError::UnrecognizedFormat);
        }
        // Fill bytes: any number of 0xFF may pad a marker
        let mut mpos = pos + 1;
        while mpos < buf.len() && buf[mpos] == 0xFF {
            mpos += 1;
        }
        if mpos >= buf.len() {
            return Ok(Step::NeedMore);
        }
        let marker = buf[mpos];
        pos = mpos + 1;

        // Standalone markers (TEM, RSTn, SOI) carry no segment
        if marker == 0x01 || (0xD0..=0xD8).contains(&marker) {
            continue;
        }
        // EOI or start of entropy-coded data without any SOF seen
        if marker == 0xD9 || marker == 0xDA {
            return Err(SniffError::UnrecognizedFormat);
        }
        if pos + 2 > buf.len() {
            return Ok(Step::NeedMore);
        }
        let seg_len = be_u16(buf, pos) as usize;
        if seg_len < 2 {
            return Err(SniffError::UnrecognizedFormat);
        }
        if is_dimension_sof(marker) {
            // Segment payload: precision(1), height(2), width(2)
            if pos + 7 > buf.len() {
                return Ok(Step::NeedMore);
            }
            return Ok(Step::Done(SniffedImage {
                format: CoverImageFormat::Jpeg,
                width: be_u16(buf, pos + 5),
                height: be_u16(buf, pos + 3),
            }));
        }
        pos += seg_len;
    }
}
