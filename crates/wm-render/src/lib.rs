pub mod glyphs;
pub mod layers;
pub mod paint;
pub mod surface;

pub use layers::{LayerError, LayerStack, RasterLayer};
pub use paint::CanvasTheme;
pub use surface::{RasterSurface, SurfaceSnapshot};
