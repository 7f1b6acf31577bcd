pub mod codec;
pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use error::{
    FormatError, HeaderField, LoadError, OversizeError, PlanningError, StorageError, SurfaceError,
};
pub use id::LayerId;
pub use model::*;
pub use viewport::{ContainerRect, ViewportTransform, clamp_zoom, compute_fit_scale};

// Re-export kurbo geometry so downstream crates share one point type
pub use kurbo::{Point, Size, Vec2};
