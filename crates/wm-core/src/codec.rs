//! Binary PGM (`P5`) codec.
//!
//! Built on `winnow` 0.7 over raw bytes. Header grammar:
//!
//! ```text
//! "P5" (ws | "#" comment-to-eol)* width (ws | comment)* height
//!      (ws | comment)* maxval <one ws byte> <width*height sample bytes>
//! ```
//!
//! Only 1-byte samples (`maxval <= 255`) are supported. Bytes past the
//! sample region are ignored.

use crate::error::{FormatError, HeaderField, LoadError, OversizeError};
use crate::model::{PixelGrid, sample_count};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// The two-byte magic of a binary graymap.
pub const MAGIC: &[u8; 2] = b"P5";

/// Largest maxval with 1-byte samples.
pub const MAX_SUPPORTED_MAXVAL: u32 = 255;

/// Largest maxval the format allows at all.
const MAX_MAXVAL: u32 = 65535;

/// Decode a P5 graymap into a `PixelGrid`.
pub fn decode(bytes: &[u8]) -> Result<PixelGrid, FormatError> {
    let magic = bytes.get(..2).unwrap_or(bytes);
    if magic != MAGIC {
        return Err(FormatError::BadMagic {
            found: magic.to_vec(),
        });
    }
    let mut rest = &bytes[2..];

    let width = header_value(&mut rest, HeaderField::Width)?;
    let height = header_value(&mut rest, HeaderField::Height)?;
    let max_val = header_value(&mut rest, HeaderField::MaxVal)?;
    if max_val > MAX_MAXVAL {
        return Err(FormatError::InvalidToken {
            field: HeaderField::MaxVal,
            token: max_val.to_string(),
        });
    }
    if max_val > MAX_SUPPORTED_MAXVAL {
        return Err(FormatError::UnsupportedDepth(max_val));
    }

    sample_separator
        .parse_next(&mut rest)
        .map_err(|_| FormatError::MissingSampleSeparator)?;

    let expected = sample_count(width, height)?;
    let samples = rest.get(..expected).ok_or(FormatError::TruncatedSamples {
        expected,
        found: rest.len(),
    })?;

    log::debug!("decoded P5 {width}x{height} maxval={max_val}");
    PixelGrid::new(width, height, max_val as u16, samples.to_vec())
}

/// Decode with a file-size ceiling checked before any parsing.
pub fn decode_limited(bytes: &[u8], max_bytes: usize) -> Result<PixelGrid, LoadError> {
    if bytes.len() > max_bytes {
        return Err(OversizeError {
            size: bytes.len(),
            limit: max_bytes,
        }
        .into());
    }
    Ok(decode(bytes)?)
}

/// Encode a grid as canonical P5: `P5\n<w> <h>\n<maxval>\n<samples>`.
pub fn encode(grid: &PixelGrid) -> Vec<u8> {
    let header = format!("P5\n{} {}\n{}\n", grid.width(), grid.height(), grid.max_val());
    let mut out = Vec::with_capacity(header.len() + grid.samples().len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(grid.samples());
    out
}

// ─── Header tokenizer ────────────────────────────────────────────────────

/// ASCII whitespace as the PGM header understands it (includes VT).
fn is_pgm_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

fn skip_ws_and_comments(input: &mut &[u8]) {
    loop {
        let _ = take_while::<_, _, ContextError>(0.., is_pgm_space).parse_next(input);
        if input.first() != Some(&b'#') {
            break;
        }
        let _ = take_till::<_, _, ContextError>(0.., b'\n').parse_next(input);
        if input.first() == Some(&b'\n') {
            *input = &input[1..];
        }
    }
}

fn header_token<'i>(input: &mut &'i [u8]) -> ModalResult<&'i [u8]> {
    take_while(1.., |b: u8| !is_pgm_space(b)).parse_next(input)
}

fn sample_separator(input: &mut &[u8]) -> ModalResult<u8> {
    one_of(is_pgm_space).parse_next(input)
}

/// Read one positive decimal header value.
fn header_value(input: &mut &[u8], field: HeaderField) -> Result<u32, FormatError> {
    skip_ws_and_comments(input);
    let token = header_token
        .parse_next(input)
        .map_err(|_| FormatError::MissingToken(field))?;
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| FormatError::InvalidToken {
            field,
            token: String::from_utf8_lossy(token).into_owned(),
        })
}
