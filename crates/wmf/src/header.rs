//! Placeable and standard WMF header parsing.

use crate::error::{InvalidArgumentSnafu, InvalidHeaderSnafu, NotAWmfSnafu, Result};
use crate::types::Rect16;

/// Magic number for the 22-byte Aldus placeable-header extension, as the little-endian `u32`
/// stored at the start of the file.
pub const PLACEABLE_MAGIC: u32 = 0x9AC6_CDD7;

/// WMF header `Type` field value for an in-memory (as opposed to disk) metafile; this is the
/// only value this interpreter accepts.
const WMF_TYPE_MEMORY: u8 = 0x01;

/// The two `Version` values the standard header is allowed to carry.
const WMF_VERSION_1: u16 = 0x0100;
const WMF_VERSION_3: u16 = 0x0300;

const PLACEABLE_HEADER_LEN: usize = 22;
const STANDARD_HEADER_LEN: usize = 18;

/// The Aldus placeable-header extension: target bounds and DPI, prepended ahead of a standard
/// WMF file.
#[derive(Debug, Clone, Copy)]
pub struct Placeable {
    pub bounds: Rect16,
    pub inch: u16,
}

/// The result of successfully parsing a WMF header.
#[derive(Debug, Clone, Copy)]
pub struct ParsedHeader {
    /// Byte offset (from the start of the input) where the first record begins.
    pub record_start: usize,
    /// Declared size of the object table (`NumberOfObjects`).
    pub object_count: u16,
    /// Present only if the file carried the 22-byte placeable extension.
    pub placeable: Option<Placeable>,
}

/// Returns `true` if `data` begins with a recognizable WMF header discriminant: the placeable
/// magic, or a standard header with `Type == 1` and a valid `Version`. Buffers too short to hold
/// either discriminant are simply not WMF.
#[must_use]
pub fn is_wmf(data: &[u8]) -> bool {
    if data.len() < STANDARD_HEADER_LEN {
        return false;
    }

    if read_u32(data, 0) == PLACEABLE_MAGIC {
        return true;
    }

    data[0] == WMF_TYPE_MEMORY && matches!(read_u16(data, 4), WMF_VERSION_1 | WMF_VERSION_3)
}

/// Parses the header (placeable, if present, then the standard header) and locates the start of
/// the record stream.
///
/// # Errors
/// Returns [`InvalidArgument`](crate::error::Error::InvalidArgument) if `data` is too short to
/// hold any header, [`NotAWmf`](crate::error::Error::NotAWmf) if the discriminant doesn't match,
/// and [`InvalidHeader`](crate::error::Error::InvalidHeader) for any other structural failure.
pub fn parse(data: &[u8]) -> Result<ParsedHeader> {
    ensure_len(data, STANDARD_HEADER_LEN, "input shorter than the smallest possible WMF header")?;

    if read_u32(data, 0) == PLACEABLE_MAGIC {
        return parse_placeable(data);
    }

    if data[0] != WMF_TYPE_MEMORY || !matches!(read_u16(data, 4), WMF_VERSION_1 | WMF_VERSION_3) {
        return NotAWmfSnafu.fail();
    }

    let (record_start, object_count) = parse_standard(data, 0)?;
    Ok(ParsedHeader { record_start, object_count, placeable: None })
}

fn parse_placeable(data: &[u8]) -> Result<ParsedHeader> {
    ensure_len(data, PLACEABLE_HEADER_LEN + STANDARD_HEADER_LEN, "truncated placeable header")?;

    let bounds = Rect16::new(
        read_i16(data, 6),
        read_i16(data, 8),
        read_i16(data, 10),
        read_i16(data, 12),
    );
    let inch = read_u16(data, 14);

    let standard = &data[PLACEABLE_HEADER_LEN..];
    if standard[0] != WMF_TYPE_MEMORY
        || !matches!(read_u16(standard, 4), WMF_VERSION_1 | WMF_VERSION_3)
    {
        return NotAWmfSnafu.fail();
    }

    let (record_start, object_count) = parse_standard(data, PLACEABLE_HEADER_LEN)?;
    Ok(ParsedHeader { record_start, object_count, placeable: Some(Placeable { bounds, inch }) })
}

/// Parses the 18-byte standard header starting at `base`, returning `(record_start,
/// object_count)`.
fn parse_standard(data: &[u8], base: usize) -> Result<(usize, u16)> {
    ensure_len(&data[base..], STANDARD_HEADER_LEN, "truncated standard header")?;

    // Type(2) HeaderSize16w(2) Version(2) Size32w(4) NumberOfObjects(2) MaxRecord(4)
    // NumberOfMembers(2)
    let header_size_words = read_u16(data, base + 2);
    let object_count = read_u16(data, base + 10);

    let record_start = base + usize::from(header_size_words) * 2;
    if record_start > data.len() {
        return InvalidHeaderSnafu { reason: "record offset past end of buffer" }.fail();
    }

    Ok((record_start, object_count))
}

fn ensure_len(data: &[u8], needed: usize, reason: &'static str) -> Result<()> {
    if data.len() < needed {
        return InvalidArgumentSnafu { reason }.fail();
    }
    Ok(())
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    read_u16(data, offset) as i16
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
