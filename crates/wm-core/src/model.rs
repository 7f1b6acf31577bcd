//! Core data model for occupancy-grid maps.
//!
//! A map is a decoded `PixelGrid` (immutable once decoded) plus the
//! operator's annotations: an ordered list of oriented `Waypoint`s and the
//! `ViewportState` they were last viewed at. Every coordinate here is in
//! image-pixel space.

use crate::error::FormatError;
use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Opaque grey of the given level.
    pub const fn gray(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    /// Same color with alpha scaled by `factor` (0.0 ..= 1.0).
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        let a = (self.a as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Rec. 601 luma, ignoring alpha.
    pub fn luma(&self) -> u8 {
        let y = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}

// ─── Pixel grid ──────────────────────────────────────────────────────────

/// A decoded single-channel grayscale image.
///
/// Invariant: `samples.len() == width * height`, both dimensions non-zero.
/// A new file produces a new grid; grids are never mutated after decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    max_val: u16,
    samples: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, max_val: u16, samples: Vec<u8>) -> Result<Self, FormatError> {
        let expected = sample_count(width, height)?;
        if samples.len() != expected {
            return Err(FormatError::TruncatedSamples {
                expected,
                found: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            max_val,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_val(&self) -> u16 {
        self.max_val
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Sample at integer pixel `(x, y)`, or `None` outside the image.
    pub fn sample(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Sample under a fractional image-space point (truncated towards -inf).
    pub fn sample_at(&self, x: f64, y: f64) -> Option<(u32, u32, u8)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (ix, iy) = (x.floor() as u32, y.floor() as u32);
        self.sample(ix, iy).map(|v| (ix, iy, v))
    }
}

/// `width * height` with the zero and overflow checks the codec relies on.
pub(crate) fn sample_count(width: u32, height: u32) -> Result<usize, FormatError> {
    if width == 0 || height == 0 {
        return Err(FormatError::EmptyImage { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(FormatError::DimensionsOverflow { width, height })
}

// ─── Annotations ─────────────────────────────────────────────────────────

/// An oriented point placed by the operator.
///
/// `theta` is the heading in radians, measured with `atan2` in image space
/// (+x right, +y down). It is stored as computed, never normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Waypoint {
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn position(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// Waypoint at `anchor` heading towards `toward`.
    pub fn aimed(anchor: kurbo::Point, toward: kurbo::Point) -> Self {
        Self::new(anchor.x, anchor.y, heading(anchor, toward))
    }
}

/// Heading from `from` to `to`: `atan2(dy, dx)`.
pub fn heading(from: kurbo::Point, to: kurbo::Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Zoom and scroll offsets of the view onto one loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub scale: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }
}
