//! Layer identifiers.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Process-wide table of layer names.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Name of a layer in a `LayerStack`, interned so ids compare and hash as
/// integers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(Spur);

impl LayerId {
    /// The decoded map image.
    pub const BASE: &'static str = "base";
    /// Grid overlay.
    pub const GRID: &'static str = "grid";
    /// Freehand pen/eraser annotation.
    pub const DRAWING: &'static str = "drawing";
    /// Waypoint arrows and badges.
    pub const WAYPOINTS: &'static str = "waypoints";
    /// Planned path preview.
    pub const PATH: &'static str = "path";

    /// Id for `s`; the same name always yields the same id.
    pub fn intern(s: &str) -> Self {
        LayerId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    pub fn base() -> Self {
        Self::intern(Self::BASE)
    }

    pub fn grid() -> Self {
        Self::intern(Self::GRID)
    }

    pub fn drawing() -> Self {
        Self::intern(Self::DRAWING)
    }

    pub fn waypoints() -> Self {
        Self::intern(Self::WAYPOINTS)
    }

    pub fn path() -> Self {
        Self::intern(Self::PATH)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LayerId::intern(&s))
    }
}
