//! Error conditions for converting a WMF file to SVG.

use snafu::prelude::*;
use wmf2svg_core::data::Error as DataError;

/// Error conditions for converting a WMF file to SVG.
///
/// Record-level problems are intentionally absent from this enum: a malformed individual record
/// is logged and skipped rather than surfaced here, consistent with the best-effort rendering
/// policy for partially corrupt files.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Thrown when the caller supplies input that can't possibly be converted, e.g. a
    /// zero-length buffer.
    #[snafu(display("Invalid argument: {reason}"))]
    InvalidArgument { reason: &'static str },
    /// Thrown when the input does not carry a recognizable WMF magic/version.
    #[snafu(display("Input is not a WMF file"))]
    NotAWmf,
    /// Thrown when the placeable or standard header fails structural validation.
    #[snafu(display("Invalid WMF header: {reason}"))]
    InvalidHeader { reason: &'static str },
    /// Thrown when the in-memory output buffer can't be grown further. Unreachable in safe Rust
    /// (allocation failure aborts rather than returning `Err`); kept so [`Error::status_code`]
    /// can still represent the full original status-code taxonomy.
    #[snafu(display("Unable to allocate output buffer"))]
    ResourceExhaustion,
}

pub(crate) type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Maps this error to the status code used by the classic `(buffer, length, status)` calling
    /// convention, for callers that need it instead of matching on [`Error`] directly.
    #[must_use]
    pub const fn status_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => -1,
            Self::NotAWmf => -2,
            Self::InvalidHeader { .. } => -3,
            Self::ResourceExhaustion => -4,
        }
    }
}

impl From<DataError> for Error {
    #[inline]
    fn from(error: DataError) -> Self {
        match error {
            DataError::EndOfFile => Self::InvalidHeader { reason: "unexpected end of file" },
            _ => panic!("Unexpected data::Error variant! Something has gone horribly wrong"),
        }
    }
}
