//! Editor configuration.
//!
//! Every tunable constant of the editor lives here. Defaults reproduce the
//! stock editor; a JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};

/// Errors from loading or validating an [`EditorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for a `MapEditor` session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Undo depth of the drawing layer. Default: **50**.
    pub history_capacity: usize,

    /// Zoom range. Default: **0.1 ..= 5.0**.
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Scale change per wheel delta unit when zooming with the wheel.
    pub wheel_zoom_speed: f64,

    /// Factor used by the keyboard zoom-in / zoom-out shortcuts.
    pub zoom_step: f64,

    /// Redraw coalescing and pointer-move thinning interval, in ms. Default: **16**.
    pub frame_interval_ms: u64,

    /// Quiet period before a persistence write, in ms. Default: **500**.
    pub persist_debounce_ms: u64,

    /// Input file size ceiling in bytes. Default: **50 MiB**.
    pub max_file_bytes: usize,

    /// Grid overlay spacing in image pixels. Default: **50**.
    pub grid_spacing: u32,

    /// Space left around the image by fit-to-container, in screen pixels.
    pub fit_padding: f64,

    /// Pen size range and initial value, in screen pixels.
    pub min_pen_size: u32,
    pub max_pen_size: u32,
    pub default_pen_size: u32,

    /// Length of a waypoint's heading arrow in image pixels.
    pub arrow_length: f64,

    /// Interpolated steps per segment for the bundled linear planner.
    pub planner_steps: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            min_zoom: crate::viewport::MIN_ZOOM,
            max_zoom: crate::viewport::MAX_ZOOM,
            wheel_zoom_speed: 0.001,
            zoom_step: 1.25,
            frame_interval_ms: 16,
            persist_debounce_ms: 500,
            max_file_bytes: 50 * 1024 * 1024,
            grid_spacing: 50,
            fit_padding: 16.0,
            min_pen_size: 1,
            max_pen_size: 50,
            default_pen_size: 5,
            arrow_length: 20.0,
            planner_steps: 20,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.history_capacity == 0 {
            return invalid("history_capacity must be at least 1");
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return invalid("zoom range must satisfy 0 < min_zoom <= max_zoom");
        }
        if self.zoom_step <= 1.0 {
            return invalid("zoom_step must be greater than 1");
        }
        if self.grid_spacing == 0 {
            return invalid("grid_spacing must be at least 1");
        }
        if self.min_pen_size == 0
            || self.min_pen_size > self.max_pen_size
            || !(self.min_pen_size..=self.max_pen_size).contains(&self.default_pen_size)
        {
            return invalid("pen sizes must satisfy 1 <= min <= default <= max");
        }
        if self.planner_steps == 0 {
            return invalid("planner_steps must be at least 1");
        }
        Ok(())
    }

    pub fn clamp_pen_size(&self, size: u32) -> u32 {
        size.clamp(self.min_pen_size, self.max_pen_size)
    }
}
