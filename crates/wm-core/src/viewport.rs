//! Screen ↔ image coordinate mapping.
//!
//! Three spaces are involved:
//!
//! - **screen**: pointer coordinates as delivered by the windowing layer;
//! - **container**: screen minus the container's origin, plus scroll offsets
//!   (the coordinates of the scaled image's own pixels);
//! - **image**: container divided by the zoom factor.
//!
//! Every consumer (drawing, picking, waypoint placement, pixel readout) goes
//! through [`ViewportTransform::screen_to_image`]; there is no second formula.

use crate::model::ViewportState;
use kurbo::{Point, Size, Vec2};

/// Lower bound for the zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Upper bound for the zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Clamp a zoom factor to `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(scale: f64) -> f64 {
    clamp_zoom_within(scale, MIN_ZOOM, MAX_ZOOM)
}

/// Clamp a zoom factor to a configured range.
pub fn clamp_zoom_within(scale: f64, min: f64, max: f64) -> f64 {
    if scale.is_nan() { min } else { scale.clamp(min, max) }
}

/// Scale at which the whole image fits inside the container.
///
/// Returns exactly `1.0` when the image already fits; never enlarges.
pub fn compute_fit_scale(image: Size, container: Size) -> f64 {
    if image.width <= container.width && image.height <= container.height {
        return 1.0;
    }
    (container.width / image.width).min(container.height / image.height)
}

/// The on-screen placement of the scrolling container that shows the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub origin: Point,
    pub size: Size,
}

impl ContainerRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn center(&self) -> Point {
        self.origin + Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }
}

impl Default for ContainerRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 800.0, 600.0)
    }
}

/// A container placement plus the current zoom/scroll state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub container: ContainerRect,
    pub state: ViewportState,
}

impl ViewportTransform {
    pub fn new(container: ContainerRect, state: ViewportState) -> Self {
        Self { container, state }
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    fn scroll(&self) -> Vec2 {
        Vec2::new(self.state.scroll_left, self.state.scroll_top)
    }

    /// `image = (screen - origin + scroll) / scale`
    pub fn screen_to_image(&self, screen: Point) -> Point {
        let container = screen - self.container.origin + self.scroll();
        (container / self.state.scale).to_point()
    }

    /// Inverse of [`screen_to_image`](Self::screen_to_image).
    pub fn image_to_screen(&self, image: Point) -> Point {
        self.container.origin + image.to_vec2() * self.state.scale - self.scroll()
    }

    /// Zoom to `target` (clamped) keeping the image point under `anchor` fixed.
    ///
    /// `new_scroll = image_point * new_scale - (anchor - origin)`, clamped at 0.
    pub fn zoom_at(&self, target: f64, anchor: Point, min: f64, max: f64) -> ViewportState {
        let scale = clamp_zoom_within(target, min, max);
        let image_point = self.screen_to_image(anchor);
        let offset = anchor - self.container.origin;
        let scroll = image_point.to_vec2() * scale - offset;
        ViewportState {
            scale,
            scroll_left: scroll.x.max(0.0),
            scroll_top: scroll.y.max(0.0),
        }
    }

    /// Scroll offsets while dragging: `anchor_scroll - (current - down)`.
    pub fn pan(anchor_scroll: Vec2, down: Point, current: Point) -> Vec2 {
        let scroll = anchor_scroll - (current - down);
        Vec2::new(scroll.x.max(0.0), scroll.y.max(0.0))
    }

    /// Fit scale for an image of `image` pixels, leaving `padding` on each axis.
    pub fn fit_scale(&self, image: Size, padding: f64) -> f64 {
        let available = Size::new(
            (self.container.size.width - padding).max(1.0),
            (self.container.size.height - padding).max(1.0),
        );
        compute_fit_scale(image, available)
    }
}
