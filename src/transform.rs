//! Transform engine: the single owner of viewport state.
//!
//! Every zoom, scroll and coordinate conversion goes through
//! [`TransformEngine`]. Host surfaces (the display area and the minimap
//! surface) are optional so the engine can exist before the host has laid
//! anything out; operations that need a missing surface are no-ops.
//!
//! State changes are reported as [`ViewEvent`]s which the controller drains
//! after each dispatch. Every operation that moves scroll or zoom recomputes
//! the minimap indicator before it returns.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use tracing::debug;

use crate::animation::ScrollAnimation;
use crate::camera::{HostViewport, Point, Rect, Viewport, clamp_zoom};
use crate::config::CanvasConfig;
use crate::consts::MAX_FIT_ZOOM;
use crate::input::{Button, Modifiers, is_pan_trigger};
use crate::minimap::{MinimapIndicator, MinimapSurface, WorldExtent};

/// Notifications produced by viewport mutations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// The zoom factor was (re)applied.
    ZoomChanged(f64),
    /// The minimap indicator was recomputed.
    MinimapUpdated(MinimapIndicator),
}

/// Drag-to-pan protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Idle,
    Panning {
        /// Client position of the pointer when the drag began.
        start_client: Point,
        /// Scroll offsets when the drag began.
        start_scroll: Point,
    },
}

/// Owner of zoom, scroll, host surfaces and the in-flight animation.
///
/// Zoom and minimap changes queue a [`ViewEvent`]. The queue is unbounded;
/// callers driving the engine directly drain it with
/// [`TransformEngine::take_events`] after each batch of calls.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    viewport: Viewport,
    host: Option<HostViewport>,
    minimap: Option<MinimapSurface>,
    indicator: Option<MinimapIndicator>,
    world: WorldExtent,
    zoom_step: f64,
    fit_margin: f64,
    pan: PanState,
    animation: Option<ScrollAnimation>,
    pending_center: Option<Point>,
    events: Vec<ViewEvent>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl TransformEngine {
    #[must_use]
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            host: None,
            minimap: None,
            indicator: None,
            world: WorldExtent { width: config.world_width, height: config.world_height },
            zoom_step: config.zoom_step,
            fit_margin: config.fit_margin,
            pan: PanState::Idle,
            animation: None,
            pending_center: None,
            events: Vec::new(),
        }
    }

    // --- Host surfaces ---

    /// Attach or replace the display area. Treated as a resize notification.
    pub fn set_host(&mut self, host: Option<HostViewport>) {
        self.host = host;
        self.update_minimap();
    }

    /// Attach or replace the minimap surface.
    pub fn set_minimap_surface(&mut self, surface: Option<MinimapSurface>) {
        self.minimap = surface;
        if surface.is_none() {
            self.indicator = None;
        }
        self.update_minimap();
    }

    // --- Queries ---

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    #[must_use]
    pub fn scroll(&self) -> Point {
        Point::new(self.viewport.scroll_x, self.viewport.scroll_y)
    }

    #[must_use]
    pub fn host(&self) -> Option<HostViewport> {
        self.host
    }

    #[must_use]
    pub fn minimap_surface(&self) -> Option<MinimapSurface> {
        self.minimap
    }

    #[must_use]
    pub fn world(&self) -> WorldExtent {
        self.world
    }

    /// Last computed minimap indicator, if both surfaces are attached.
    #[must_use]
    pub fn indicator(&self) -> Option<MinimapIndicator> {
        self.indicator
    }

    #[must_use]
    pub fn pan_state(&self) -> PanState {
        self.pan
    }

    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self.pan, PanState::Panning { .. })
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// True while an animation or a deferred center step still needs frames.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.animation.is_some() || self.pending_center.is_some()
    }

    /// Drain the notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Coordinate conversions ---

    /// Client point to canvas coordinates. `None` without a display area.
    #[must_use]
    pub fn screen_to_canvas(&self, client: Point) -> Option<Point> {
        self.host.map(|host| self.viewport.screen_to_canvas(&host, client))
    }

    /// Canvas point to client coordinates. `None` without a display area.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Option<Point> {
        self.host.map(|host| self.viewport.canvas_to_screen(&host, canvas))
    }

    /// Canvas rectangle currently on screen. `None` without a display area.
    #[must_use]
    pub fn visible_area(&self) -> Option<Rect> {
        self.host.map(|host| self.viewport.visible_area(&host))
    }

    /// Whether canvas point `p` is on screen. False without a display area.
    #[must_use]
    pub fn is_point_visible(&self, p: Point) -> bool {
        self.visible_area().is_some_and(|area| area.contains(p))
    }

    // --- Zoom ---

    /// Clamp and apply a zoom factor. Scroll offsets are left alone.
    ///
    /// Cancels any in-flight animation or deferred center step, whose targets
    /// were computed at the old zoom. Returns the applied zoom, or `None` while
    /// a pan drag owns the viewport.
    pub fn set_zoom(&mut self, zoom: f64) -> Option<f64> {
        if self.is_panning() {
            debug!(zoom, "set_zoom ignored while panning");
            return None;
        }
        self.animation = None;
        self.pending_center = None;
        let applied = self.apply_zoom(zoom);
        self.update_minimap();
        Some(applied)
    }

    /// Zoom to `new_zoom` keeping the canvas point under `client` fixed on screen.
    ///
    /// The ratio is taken from the clamped zoom so the anchor holds at the limits.
    /// Cancels any in-flight scroll animation.
    pub fn zoom_to_point(&mut self, new_zoom: f64, client: Point) -> bool {
        let Some(host) = self.host else {
            debug!("zoom_to_point without a display area");
            return false;
        };
        if self.is_panning() {
            debug!("zoom_to_point ignored while panning");
            return false;
        }
        let local = host.to_local(client);
        let target = clamp_zoom(new_zoom);
        let ratio = target / self.viewport.zoom;
        let scroll_x = (self.viewport.scroll_x + local.x) * ratio - local.x;
        let scroll_y = (self.viewport.scroll_y + local.y) * ratio - local.y;

        self.animation = None;
        self.pending_center = None;
        self.apply_zoom(target);
        self.viewport.scroll_x = scroll_x;
        self.viewport.scroll_y = scroll_y;
        self.update_minimap();
        true
    }

    /// Zoom in by one step around the viewport center.
    pub fn zoom_in(&mut self) -> bool {
        self.zoom_about_center(self.viewport.zoom * self.zoom_step)
    }

    /// Zoom out by one step around the viewport center.
    pub fn zoom_out(&mut self) -> bool {
        self.zoom_about_center(self.viewport.zoom / self.zoom_step)
    }

    /// Return to 100% around the viewport center.
    pub fn reset_zoom(&mut self) -> bool {
        self.zoom_about_center(1.0)
    }

    fn zoom_about_center(&mut self, zoom: f64) -> bool {
        let Some(host) = self.host else {
            debug!("zoom step without a display area");
            return false;
        };
        self.zoom_to_point(zoom, host.client_center())
    }

    // --- Pan ---

    /// Begin a pan drag if `button`/`modifiers` form the pan trigger.
    ///
    /// Starting a pan drops any in-flight animation or deferred center step.
    pub fn pan_start(&mut self, client: Point, button: Button, modifiers: Modifiers) -> bool {
        if !is_pan_trigger(button, modifiers) {
            return false;
        }
        if self.host.is_none() {
            debug!("pan_start without a display area");
            return false;
        }
        self.animation = None;
        self.pending_center = None;
        self.pan = PanState::Panning { start_client: client, start_scroll: self.scroll() };
        true
    }

    /// Apply the drag delta since `pan_start` to the scroll offsets.
    pub fn pan_move(&mut self, client: Point) -> bool {
        let PanState::Panning { start_client, start_scroll } = self.pan else {
            return false;
        };
        self.viewport.scroll_x = start_scroll.x - (client.x - start_client.x);
        self.viewport.scroll_y = start_scroll.y - (client.y - start_client.y);
        self.update_minimap();
        true
    }

    /// End the pan drag (release or pointer-leave). Returns whether a drag was active.
    pub fn pan_end(&mut self) -> bool {
        let was_panning = self.is_panning();
        self.pan = PanState::Idle;
        was_panning
    }

    /// Scroll by a screen-space delta, as a plain wheel does.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> bool {
        if self.host.is_none() || self.is_panning() {
            return false;
        }
        self.animation = None;
        self.viewport.scroll_x += dx;
        self.viewport.scroll_y += dy;
        self.update_minimap();
        true
    }

    // --- Navigation ---

    /// Put canvas point `target` at the center of the display area.
    pub fn center_on(&mut self, target: Point) -> bool {
        let Some(host) = self.host else {
            debug!("center_on without a display area");
            return false;
        };
        if self.is_panning() {
            return false;
        }
        let scroll = self.viewport.scroll_centering(&host, target);
        self.viewport.scroll_x = scroll.x;
        self.viewport.scroll_y = scroll.y;
        self.update_minimap();
        true
    }

    /// Zoom so every body in `bodies` fits, then center on them.
    ///
    /// The zoom never exceeds 100%. The center step is deferred to the next
    /// [`tick`](Self::tick) so the host can settle its geometry first. An
    /// empty set leaves the viewport untouched.
    pub fn fit_to_content<I>(&mut self, bodies: I) -> bool
    where
        I: IntoIterator<Item = Rect>,
    {
        let Some(host) = self.host else {
            debug!("fit_to_content without a display area");
            return false;
        };
        if self.is_panning() {
            return false;
        }
        let Some(bounds) = bodies.into_iter().reduce(|acc, r| acc.union(&r)) else {
            debug!("fit_to_content with no devices");
            return false;
        };
        let content = bounds.inflate(self.fit_margin);
        let fit_x = if content.width > 0.0 { host.width / content.width } else { 1.0 };
        let fit_y = if content.height > 0.0 { host.height / content.height } else { 1.0 };
        let optimal = fit_x.min(fit_y).min(MAX_FIT_ZOOM);

        self.animation = None;
        self.apply_zoom(optimal);
        self.update_minimap();
        self.pending_center = Some(content.center());
        debug!(zoom = self.viewport.zoom, "fit_to_content");
        true
    }

    /// Animate the scroll offsets to `target` with an ease-out cubic profile.
    ///
    /// Replaces any animation already in flight. The animation clock starts at
    /// the next `tick`.
    pub fn animate_scroll_to(&mut self, target: Point, duration_ms: f64) -> bool {
        if self.host.is_none() {
            debug!("animate_scroll_to without a display area");
            return false;
        }
        if self.is_panning() {
            return false;
        }
        self.animation = Some(ScrollAnimation::new(self.scroll(), target, duration_ms));
        true
    }

    /// Animate so that canvas point `target` ends up at the display center.
    pub fn animate_center_on(&mut self, target: Point, duration_ms: f64) -> bool {
        let Some(host) = self.host else {
            return false;
        };
        let scroll = self.viewport.scroll_centering(&host, target);
        self.animate_scroll_to(scroll, duration_ms)
    }

    /// Advance one host frame: run a deferred center step, then step the animation.
    ///
    /// Returns whether scroll offsets changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let mut changed = false;
        if let Some(center) = self.pending_center.take() {
            changed |= self.center_on(center);
        }
        if let Some(animation) = self.animation.as_mut() {
            let step = animation.step(now_ms);
            self.viewport.scroll_x = step.scroll.x;
            self.viewport.scroll_y = step.scroll.y;
            if step.finished {
                self.animation = None;
            }
            self.update_minimap();
            changed = true;
        }
        changed
    }

    /// Zoom 100%, scroll at the origin, nothing in flight.
    pub fn reset(&mut self) {
        self.pan = PanState::Idle;
        self.animation = None;
        self.pending_center = None;
        self.apply_zoom(1.0);
        self.viewport.scroll_x = 0.0;
        self.viewport.scroll_y = 0.0;
        self.update_minimap();
    }

    // --- Minimap ---

    /// Recompute the minimap indicator from the visible area.
    pub fn update_minimap(&mut self) {
        let (Some(host), Some(surface)) = (self.host, self.minimap) else {
            return;
        };
        let visible = self.viewport.visible_area(&host);
        let indicator = surface.indicator(self.world, visible);
        self.indicator = Some(indicator);
        self.events.push(ViewEvent::MinimapUpdated(indicator));
    }

    /// Canvas point under a point on the minimap surface.
    #[must_use]
    pub fn minimap_to_canvas(&self, local: Point) -> Option<Point> {
        self.minimap.map(|surface| surface.to_world(self.world, local))
    }

    fn apply_zoom(&mut self, zoom: f64) -> f64 {
        let zoom = clamp_zoom(zoom);
        self.viewport.zoom = zoom;
        self.events.push(ViewEvent::ZoomChanged(zoom));
        zoom
    }
}
