//! Interprets Windows Metafile (WMF) records and emits equivalent SVG XML.
//!
//! [`is_wmf`] cheaply checks a buffer's header discriminant; [`convert`] parses the header and
//! walks the record stream, producing a self-contained SVG document (or bare `<svg>` fragment).
//! Records this interpreter doesn't recognize, and individual records that fail to parse, are
//! skipped rather than treated as fatal, since a best-effort render of a partially unsupported or
//! corrupt file is more useful to callers than an all-or-nothing failure.

use wmf2svg_core::identify::{FileIdentifier, FileInfo};

pub mod coords;
pub mod error;
pub mod header;
pub mod records;
pub mod state;
pub mod svg;
pub mod types;

pub use error::Error;

/// Options controlling how [`convert`] renders a WMF file to SVG.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// XML namespace prefix applied to every emitted tag, e.g. `"wmf"` produces `<wmf:rect>`.
    /// Empty (the default) emits unprefixed tags with a plain `xmlns` attribute.
    pub name_space: String,
    /// Enables `log::warn!` diagnostics for skipped/malformed records.
    pub verbose: bool,
    /// Whether to wrap the output in an XML prolog (`<?xml version="1.0" ...?>`). Set this to
    /// `false` when embedding the result as a fragment inside a larger document.
    pub svg_delimiter: bool,
    /// Overrides the output canvas width in pixels; `0` uses the placeable header's DPI (or a
    /// 1000-unit default canvas if the file carries no placeable header).
    pub img_width: u32,
    /// Overrides the output canvas height in pixels. See [`Self::img_width`].
    pub img_height: u32,
}

impl Default for ConvertOptions {
    #[inline]
    fn default() -> Self {
        Self {
            name_space: String::new(),
            verbose: false,
            svg_delimiter: true,
            img_width: 0,
            img_height: 0,
        }
    }
}

/// Returns `true` if `data` begins with a recognizable WMF header.
#[must_use]
#[inline]
pub fn is_wmf(data: &[u8]) -> bool {
    header::is_wmf(data)
}

/// Parses `data` as a WMF file and renders it to an SVG document per `options`.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if `data` is too short to hold a header,
/// [`Error::NotAWmf`] if the header discriminant doesn't match, and [`Error::InvalidHeader`] if
/// header parsing otherwise fails structurally. Problems in the record stream past the header
/// are not surfaced as errors; see the module-level documentation.
pub fn convert(data: &[u8], options: &ConvertOptions) -> Result<String, Error> {
    let parsed = header::parse(data)?;
    Ok(records::interpret(data, &parsed, options))
}

/// Marker type implementing [`FileIdentifier`] for WMF files, for use in a shallow- or deep-scan
/// identification pass alongside identifiers for other file formats.
#[derive(Debug, Clone, Copy)]
pub struct Wmf;

impl FileIdentifier for Wmf {
    fn identify(data: &[u8]) -> Option<FileInfo> {
        let parsed = header::parse(data).ok()?;
        let kind = if parsed.placeable.is_some() { "placeable" } else { "standard" };
        let info = format!(
            "Windows Metafile ({kind}), {} objects, records start at offset {}",
            parsed.object_count,
            parsed.record_start
        );
        Some(FileInfo::new(info, None))
    }

    fn identify_deep(data: &[u8]) -> Option<FileInfo> {
        let info = Self::identify(data)?;
        let payload = convert(data, &ConvertOptions::default())
            .ok()
            .map(|svg| svg.into_bytes().into_boxed_slice());
        Some(FileInfo::new(info.info, payload))
    }
}
