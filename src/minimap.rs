//! Overview ("minimap") projection.
//!
//! The minimap represents a fixed logical world, larger than any single
//! viewport, scaled down onto a small host surface. The indicator is the
//! visible canvas rectangle projected into that surface.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, Rect};

/// Size of the host's overview surface, in its own pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimapSurface {
    pub width: f64,
    pub height: f64,
}

/// Logical extent of the world the minimap represents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldExtent {
    pub width: f64,
    pub height: f64,
}

/// Position and size of the visible-area indicator on the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinimapIndicator {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MinimapSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Minimap pixels per world unit, per axis.
    #[must_use]
    pub fn scale(&self, world: WorldExtent) -> (f64, f64) {
        (self.width / world.width, self.height / world.height)
    }

    /// Project a visible canvas rectangle onto this surface.
    #[must_use]
    pub fn indicator(&self, world: WorldExtent, visible: Rect) -> MinimapIndicator {
        let (sx, sy) = self.scale(world);
        MinimapIndicator {
            x: visible.x * sx,
            y: visible.y * sy,
            width: visible.width * sx,
            height: visible.height * sy,
        }
    }

    /// Map a point on this surface back to the world point it represents.
    #[must_use]
    pub fn to_world(&self, world: WorldExtent, local: Point) -> Point {
        let (sx, sy) = self.scale(world);
        Point::new(local.x / sx, local.y / sy)
    }
}
