//! Path planning collaborator.
//!
//! The editor hands the ordered waypoint list to a `PathPlanner` and paints
//! whatever polyline comes back. `LinearPlanner` is the bundled stand-in.

use kurbo::Point;
use wm_core::{PlanningError, Waypoint};

pub trait PathPlanner {
    /// Polyline through the waypoints, in image space.
    fn plan(&mut self, waypoints: &[Waypoint]) -> Result<Vec<Point>, PlanningError>;
}

/// Straight segments between consecutive waypoints, each sampled at
/// `steps + 1` evenly spaced points (both endpoints included, so joints
/// appear twice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearPlanner {
    pub steps: usize,
}

impl LinearPlanner {
    pub fn new(steps: usize) -> Self {
        Self { steps: steps.max(1) }
    }
}

impl Default for LinearPlanner {
    fn default() -> Self {
        Self::new(20)
    }
}

impl PathPlanner for LinearPlanner {
    fn plan(&mut self, waypoints: &[Waypoint]) -> Result<Vec<Point>, PlanningError> {
        if waypoints.len() < 2 {
            return Ok(Vec::new());
        }
        if let Some(bad) = waypoints.iter().find(|w| !(w.x.is_finite() && w.y.is_finite())) {
            return Err(PlanningError(format!("waypoint ({}, {}) is not finite", bad.x, bad.y)));
        }
        let steps = self.steps.max(1);
        let mut path = Vec::with_capacity((waypoints.len() - 1) * (steps + 1));
        for pair in waypoints.windows(2) {
            let (a, b) = (pair[0].position(), pair[1].position());
            path.extend((0..=steps).map(|i| a.lerp(b, i as f64 / steps as f64)));
        }
        Ok(path)
    }
}
