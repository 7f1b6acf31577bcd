//! Error taxonomy shared by every waymark crate.
//!
//! Decode and load failures abort the current load without touching the
//! previously loaded map. Storage and planning failures are reported to the
//! session, which logs and recovers.

use std::fmt;

/// Which header token of a P5 file a [`FormatError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Width,
    Height,
    MaxVal,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeaderField::Width => "width",
            HeaderField::Height => "height",
            HeaderField::MaxVal => "maxval",
        })
    }
}

/// Malformed or unsupported input file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unsupported magic {found:?} (only binary P5 graymaps are supported)")]
    BadMagic { found: Vec<u8> },

    #[error("missing {0} in header")]
    MissingToken(HeaderField),

    #[error("invalid {field} token {token:?}")]
    InvalidToken { field: HeaderField, token: String },

    #[error("no whitespace after maxval")]
    MissingSampleSeparator,

    #[error("maxval {0} needs 2-byte samples, which are not supported")]
    UnsupportedDepth(u32),

    #[error("image must be at least 1x1, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("image dimensions {width}x{height} are too large")]
    DimensionsOverflow { width: u32, height: u32 },

    #[error("sample region holds {found} bytes, expected {expected}")]
    TruncatedSamples { expected: usize, found: usize },
}

/// Input file exceeds the configured size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file is {size} bytes, limit is {limit} bytes")]
pub struct OversizeError {
    pub size: usize,
    pub limit: usize,
}

/// Failure of the external persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("could not encode session record: {0}")]
    Encode(String),

    #[error("could not decode session record: {0}")]
    Decode(String),
}

/// Failure of the external path planner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path planning failed: {0}")]
pub struct PlanningError(pub String);

/// Failure to allocate a raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("could not allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
}

/// Everything that can abort loading a map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Oversize(#[from] OversizeError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
