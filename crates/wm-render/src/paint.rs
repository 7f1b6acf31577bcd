//! Layer painters.
//!
//! Each painter owns one layer's content outright: it clears the surface
//! and redraws everything from the model. All sizes are image pixels unless
//! a `scale` is passed, in which case the size is screen pixels divided by
//! it so the result looks the same at every zoom level.

use crate::glyphs;
use crate::surface::RasterSurface;
use kurbo::{Point, Vec2};
use wm_core::{Color, PixelGrid, Waypoint};

/// Theme-dependent colors for the layer painters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasTheme {
    /// Opaque composite background.
    pub bg: Color,
    pub grid: Color,
    pub pen: Color,
    pub eraser: Color,
    pub arrow: Color,
    pub badge_fill: Color,
    pub badge_text: Color,
    pub path_line: Color,
    pub path_dot: Color,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: Color::rgb(0xF5, 0xF5, 0xF7),
            grid: Color::rgba(255, 0, 0, 77),
            pen: Color::BLACK,
            eraser: Color::WHITE,
            arrow: Color::rgb(0x00, 0x71, 0xE3),
            badge_fill: Color::rgb(0x00, 0x71, 0xE3),
            badge_text: Color::WHITE,
            path_line: Color::rgb(0x34, 0xC7, 0x59),
            path_dot: Color::rgb(0x24, 0x8A, 0x3D),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::rgb(0x1C, 0x1C, 0x1E),
            grid: Color::rgba(255, 0, 0, 77),
            pen: Color::BLACK,
            eraser: Color::WHITE,
            arrow: Color::rgb(0x0A, 0x84, 0xFF),
            badge_fill: Color::rgb(0x0A, 0x84, 0xFF),
            badge_text: Color::WHITE,
            path_line: Color::rgb(0x30, 0xD1, 0x58),
            path_dot: Color::rgb(0x63, 0xE6, 0x83),
        }
    }
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Badge circle radius around a waypoint.
pub const BADGE_RADIUS: f64 = 7.0;
const ARROW_WIDTH: f64 = 2.0;
const PATH_WIDTH: f64 = 2.0;
const PATH_DOT_RADIUS: f64 = 2.5;

// ─── Painters ────────────────────────────────────────────────────────────

/// Opaque grey image of the decoded map.
pub fn paint_base(surface: &mut RasterSurface, grid: &PixelGrid) {
    if surface.dimensions() != (grid.width(), grid.height()) {
        log::warn!(
            "base layer is {:?}, map is {}x{}; skipping",
            surface.dimensions(),
            grid.width(),
            grid.height()
        );
        return;
    }
    for (y, row) in grid.samples().chunks(grid.width() as usize).enumerate() {
        for (x, &s) in row.iter().enumerate() {
            surface.put_pixel(x as u32, y as u32, Color::gray(s));
        }
    }
}

/// Lines every `spacing` image pixels, `1 / scale` wide, edge lines included.
pub fn paint_grid(surface: &mut RasterSurface, spacing: u32, scale: f64, color: Color) {
    surface.clear();
    if spacing == 0 {
        return;
    }
    let (w, h) = surface.dimensions();
    let width = 1.0 / scale;
    for x in (0..=w).step_by(spacing as usize) {
        let x = x as f64;
        surface.stroke_segment(Point::new(x, 0.0), Point::new(x, h as f64), width, color);
    }
    for y in (0..=h).step_by(spacing as usize) {
        let y = y as f64;
        surface.stroke_segment(Point::new(0.0, y), Point::new(w as f64, y), width, color);
    }
    log::trace!("grid repainted at scale {scale}");
}

/// Numbered arrows for every waypoint, plus an unnumbered translucent
/// arrow for a placement in progress.
pub fn paint_waypoints(
    surface: &mut RasterSurface,
    waypoints: &[Waypoint],
    preview: Option<Waypoint>,
    arrow_length: f64,
    theme: &CanvasTheme,
) {
    surface.clear();
    for (i, wp) in waypoints.iter().enumerate() {
        paint_arrow(surface, wp, arrow_length, theme.arrow);
        paint_badge(surface, wp.position(), i + 1, theme);
    }
    if let Some(wp) = preview {
        paint_arrow(surface, &wp, arrow_length, theme.arrow.with_alpha_factor(0.5));
    }
}

/// The planned polyline with a dot on every vertex.
pub fn paint_path(surface: &mut RasterSurface, points: &[Point], theme: &CanvasTheme) {
    surface.clear();
    if points.len() > 1 {
        surface.stroke_polyline(points, PATH_WIDTH, theme.path_line);
    }
    for &p in points {
        surface.fill_circle(p, PATH_DOT_RADIUS, theme.path_dot);
    }
}

fn paint_arrow(surface: &mut RasterSurface, wp: &Waypoint, length: f64, color: Color) {
    let origin = wp.position();
    let dir = Vec2::from_angle(wp.theta);
    let tip = origin + dir * length;
    surface.stroke_segment(origin, tip, ARROW_WIDTH, color);

    // head barbs at ±150° from the heading
    let barb = length * 0.35;
    for side in [-1.0, 1.0] {
        let back = Vec2::from_angle(wp.theta + side * 150f64.to_radians());
        surface.stroke_segment(tip, tip + back * barb, ARROW_WIDTH, color);
    }
}

fn paint_badge(surface: &mut RasterSurface, centre: Point, number: usize, theme: &CanvasTheme) {
    surface.fill_circle(centre, BADGE_RADIUS, theme.badge_fill);
    let label = number.to_string();
    let cell = if label.len() > 1 { 1.5 } else { 2.0 };
    glyphs::draw_digits(surface, &label, centre, cell, theme.badge_text);
}
