//! Viewport state and coordinate conversions.
//!
//! Three spaces meet here: client pixels (as reported by the host), the
//! scaled canvas the host scrolls over, and unscaled canvas space where
//! device positions live. `Viewport` carries the mutable zoom and scroll
//! offsets; `HostViewport` is the host's display area, read each frame and
//! never owned by the engine.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in client, screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build the rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self { x, y, width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Closed containment: points on the edges are inside.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect { x, y, width: right - x, height: bottom - y }
    }

    /// Grow on every side by `margin`.
    #[must_use]
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }
}

/// The host's display area: where the viewport sits in client space and how big it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostViewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl HostViewport {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Center of the display area in client coordinates.
    #[must_use]
    pub fn client_center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Convert a client point into viewport-local pixels.
    #[must_use]
    pub fn to_local(&self, client: Point) -> Point {
        Point::new(client.x - self.left, client.y - self.top)
    }
}

/// Zoom factor and scroll offsets.
///
/// `scroll_x` / `scroll_y` are the visible top-left corner in scaled canvas
/// pixels. They are never clamped; overscroll is legal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, scroll_x: 0.0, scroll_y: 0.0 }
    }
}

/// Clamp a requested zoom into the supported range. NaN maps to 1.0.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Viewport {
    /// Convert a client-space point to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, host: &HostViewport, client: Point) -> Point {
        Point {
            x: (client.x - host.left + self.scroll_x) / self.zoom,
            y: (client.y - host.top + self.scroll_y) / self.zoom,
        }
    }

    /// Convert a canvas-space point to client coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, host: &HostViewport, canvas: Point) -> Point {
        Point {
            x: canvas.x * self.zoom - self.scroll_x + host.left,
            y: canvas.y * self.zoom - self.scroll_y + host.top,
        }
    }

    /// The canvas-space rectangle currently shown in `host`.
    #[must_use]
    pub fn visible_area(&self, host: &HostViewport) -> Rect {
        Rect {
            x: self.scroll_x / self.zoom,
            y: self.scroll_y / self.zoom,
            width: host.width / self.zoom,
            height: host.height / self.zoom,
        }
    }

    /// Scroll offsets that put canvas point `target` at the center of `host`.
    #[must_use]
    pub fn scroll_centering(&self, host: &HostViewport, target: Point) -> Point {
        Point {
            x: target.x * self.zoom - host.width / 2.0,
            y: target.y * self.zoom - host.height / 2.0,
        }
    }

    /// Convert a screen distance (pixels) to canvas distance.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }
}
