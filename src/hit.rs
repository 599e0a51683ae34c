//! Spatial queries over the device registry.
//!
//! All coordinates are canvas space. Hit-testing walks devices in insertion
//! order and the first match wins, so when bodies overlap the device placed
//! earliest is the one reported.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, Rect};
use crate::doc::{Device, DeviceRegistry};

impl DeviceRegistry {
    /// First device (insertion order) whose full body contains `p`.
    #[must_use]
    pub fn get_device_at(&self, p: Point) -> Option<&Device> {
        self.iter().find(|d| d.rect().contains(p))
    }

    /// Devices whose top-left position lies in the closed rectangle spanned
    /// by `(x1, y1)` and `(x2, y2)`. Corners may be given in any order.
    ///
    /// Only the position is tested, not the whole body.
    #[must_use]
    pub fn get_devices_in_area(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<&Device> {
        let area = Rect::from_corners(Point::new(x1, y1), Point::new(x2, y2));
        self.iter().filter(|d| area.contains(d.position())).collect()
    }

    /// Select every device whose position lies in the area.
    ///
    /// Without `multi` the previous selection is replaced. Returns how many
    /// devices matched.
    pub fn select_in_area(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, multi: bool) -> usize {
        let ids: Vec<_> = self.get_devices_in_area(x1, y1, x2, y2).into_iter().map(|d| d.id.clone()).collect();
        if !multi {
            self.clear_selection();
        }
        for id in &ids {
            if let Err(e) = self.select_device(id, true) {
                tracing::debug!(error = %e, "select_in_area skipped device");
            }
        }
        ids.len()
    }

    /// Body rectangles of every device, in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = Rect> + '_ {
        self.iter().map(Device::rect)
    }

    /// Bounding box of every device body, or `None` when the registry is empty.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.bodies().reduce(|acc, r| acc.union(&r))
    }
}
