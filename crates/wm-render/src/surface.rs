//! Software RGBA raster surface.
//!
//! Straight-alpha 8-bit pixels stored in an `image::RgbaImage`. All drawing
//! primitives work in image-pixel space with pixel centres at
//! `(x + 0.5, y + 0.5)` and are clipped to the surface; nothing here can grow
//! or shrink a surface.

use image::{ImageBuffer, Rgba, RgbaImage};
use kurbo::{Point, Rect};
use wm_core::{Color, FormatError, PixelGrid, SurfaceError};

/// A fixed-size RGBA pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterSurface {
    image: RgbaImage,
}

/// A full copy of a surface's pixels, detached from the surface it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    image: RgbaImage,
}

impl SurfaceSnapshot {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl std::fmt::Debug for SurfaceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "SurfaceSnapshot({w}x{h})")
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "RasterSurface({w}x{h})")
    }
}

#[inline]
fn to_rgba(c: Color) -> Rgba<u8> {
    Rgba([c.r, c.g, c.b, c.a])
}

#[inline]
fn to_color(p: &Rgba<u8>) -> Color {
    let [r, g, b, a] = p.0;
    Color::rgba(r, g, b, a)
}

/// Byte length of a `width × height` RGBA buffer, if addressable.
fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

fn allocate(width: u32, height: u32, fill: Color) -> Result<RgbaImage, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::Empty { width, height });
    }
    let len = rgba_len(width, height).ok_or(SurfaceError::Allocation { width, height })?;
    let mut raw = Vec::new();
    raw.try_reserve_exact(len)
        .map_err(|_| SurfaceError::Allocation { width, height })?;
    raw.extend(std::iter::repeat_n([fill.r, fill.g, fill.b, fill.a], len / 4).flatten());
    ImageBuffer::from_raw(width, height, raw).ok_or(SurfaceError::Allocation { width, height })
}

impl RasterSurface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, SurfaceError> {
        Ok(Self {
            image: allocate(width, height, color)?,
        })
    }

    /// Opaque grey expansion of a decoded map: each sample is its own grey level.
    pub fn from_grid(grid: &PixelGrid) -> Result<Self, SurfaceError> {
        let mut surface = Self::new(grid.width(), grid.height())?;
        for (px, &s) in surface.image.pixels_mut().zip(grid.samples()) {
            *px = Rgba([s, s, s, 255]);
        }
        Ok(surface)
    }

    /// Rebuild a surface from `to_rgba_bytes` output. `None` if the length is wrong.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if width == 0 || height == 0 || rgba_len(width, height)? != bytes.len() {
            return None;
        }
        ImageBuffer::from_raw(width, height, bytes.to_vec()).map(|image| Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Row-major pixels.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.image.pixels().map(to_color)
    }

    /// The backing buffer.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(to_color)
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(px) = self.image.get_pixel_mut_checked(x, y) {
            *px = to_rgba(color);
        }
    }

    /// Source-over one pixel. Out-of-bounds writes are ignored.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color) {
        if let Some(px) = self.image.get_pixel_mut_checked(x, y) {
            *px = to_rgba(source_over(to_color(px), color));
        }
    }

    pub fn fill(&mut self, color: Color) {
        let rgba = to_rgba(color);
        for px in self.image.pixels_mut() {
            *px = rgba;
        }
    }

    pub fn clear(&mut self) {
        self.fill(Color::TRANSPARENT);
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    /// Paint `src` over this surface with source-over. Sizes must match;
    /// the overlapping region is used otherwise.
    pub fn draw_over(&mut self, src: &RasterSurface) {
        if src.dimensions() == self.dimensions() {
            for (dst, s) in self.image.pixels_mut().zip(src.image.pixels()) {
                if s[3] != 0 {
                    *dst = to_rgba(source_over(to_color(dst), to_color(s)));
                }
            }
            return;
        }
        let (w, h) = (self.width().min(src.width()), self.height().min(src.height()));
        for y in 0..h {
            for x in 0..w {
                if let Some(s) = src.pixel(x, y) {
                    self.blend_pixel(x, y, s);
                }
            }
        }
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            image: self.image.clone(),
        }
    }

    /// Copy a snapshot's pixels back in. Caller checks the dimensions.
    pub(crate) fn copy_from(&mut self, snapshot: &SurfaceSnapshot) {
        self.image.copy_from_slice(snapshot.image.as_raw());
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.image.as_raw().clone()
    }

    /// Flatten to an 8-bit graymap using each pixel's luma.
    pub fn to_gray_grid(&self) -> Result<PixelGrid, FormatError> {
        let samples = self.pixels().map(|c| c.luma()).collect();
        PixelGrid::new(self.width(), self.height(), 255, samples)
    }

    // ─── Primitives ──────────────────────────────────────────────────────

    /// Anti-aliased line from `a` to `b` with round caps (a capsule).
    /// `a == b` paints a round dot of diameter `width`.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f64, color: Color) {
        let radius = width / 2.0;
        if !(radius > 0.0 && radius.is_finite() && a.is_finite() && b.is_finite()) {
            return;
        }
        let reach = radius + 1.0;
        let bounds = Rect::from_points(a, b).inflate(reach, reach);
        let Some((x0, y0, x1, y1)) = self.pixel_span(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (radius + 0.5 - distance_to_segment(centre, a, b)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color.with_alpha_factor(coverage as f32));
                }
            }
        }
    }

    /// Connected strokes through every point, round joins.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Color) {
        match points {
            [] => {}
            [only] => self.stroke_segment(*only, *only, width, color),
            _ => {
                for pair in points.windows(2) {
                    self.stroke_segment(pair[0], pair[1], width, color);
                }
            }
        }
    }

    pub fn fill_circle(&mut self, centre: Point, radius: f64, color: Color) {
        self.stroke_segment(centre, centre, radius * 2.0, color);
    }

    /// Fill a rectangle, weighting edge pixels by covered area.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.abs();
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        for y in y0..y1 {
            let cover_y = ((y + 1) as f64).min(rect.y1) - (y as f64).max(rect.y0);
            if cover_y <= 0.0 {
                continue;
            }
            for x in x0..x1 {
                let cover_x = ((x + 1) as f64).min(rect.x1) - (x as f64).max(rect.x0);
                if cover_x > 0.0 {
                    let coverage = (cover_x * cover_y).min(1.0);
                    self.blend_pixel(x, y, color.with_alpha_factor(coverage as f32));
                }
            }
        }
    }

    /// Integer pixel range `[x0, x1) × [y0, y1)` touched by `rect`, clipped.
    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        if !rect.is_finite() {
            return None;
        }
        let (width, height) = self.dimensions();
        let clip = |v: f64, max: u32| v.clamp(0.0, max as f64) as u32;
        let x0 = clip(rect.x0.floor(), width);
        let y0 = clip(rect.y0.floor(), height);
        let x1 = clip(rect.x1.ceil(), width);
        let y1 = clip(rect.y1.ceil(), height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/// Standard source-over for straight-alpha colors.
pub fn source_over(dst: Color, src: Color) -> Color {
    match src.a {
        0 => return dst,
        255 => return src,
        _ => {}
    }
    let sa = src.a as f32 / 255.0;
    let da = dst.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::rgba(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}
