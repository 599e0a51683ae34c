//! Canvas controller: the thin layer between host events and the two stores.
//!
//! [`CanvasController`] owns the [`DeviceRegistry`], the [`TransformEngine`],
//! the connection collaborator and the gesture state. Host input arrives as
//! [`InputEvent`]s through [`CanvasController::dispatch`]; entity requests
//! from other host widgets (palette drops, property editors, project loads)
//! arrive through the direct methods. Every entry point returns the
//! [`Action`]s the host must act on, ending with `RenderNeeded` whenever
//! state changed.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;
use tracing::{debug, warn};

use crate::camera::{HostViewport, Point, Rect};
use crate::catalog::DeviceCatalog;
use crate::config::CanvasConfig;
use crate::connections::ConnectionManager;
use crate::consts::{CLICK_SLOP_PX, NUDGE_STEP, NUDGE_STEP_FINE};
use crate::doc::{Device, DeviceEvent, DeviceId, DeviceOverrides, DeviceRegistry, DeviceUpdate};
use crate::input::{Button, InputEvent, InputState, Key, Modifiers, WheelDelta};
use crate::minimap::{MinimapIndicator, MinimapSurface};
use crate::state::SharedState;
use crate::transform::{TransformEngine, ViewEvent};
use crate::validate::{validate_device, validate_overrides, validate_update};

/// Actions returned from the controller for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    DeviceCreated { device: Device },
    DeviceUpdated { device: Device },
    DeviceMoved { id: DeviceId, x: f64, y: f64 },
    DeviceRemoved { id: DeviceId },
    DeviceSelected { device: Device },
    DeviceDeselected { id: DeviceId },
    SelectionCleared,
    DevicesImported { count: usize },
    Cleared,
    ZoomChanged { zoom: f64, percent: u32 },
    /// Scroll offsets the host should apply to its scroll container.
    ScrollChanged { scroll: Point },
    MinimapUpdated { indicator: MinimapIndicator },
    /// Rubber-band rectangle in canvas space while a selection drag is active.
    SelectionBand { rect: Rect },
    SetCursor { cursor: &'static str },
    /// A request was refused; the reason is for display or logs.
    Rejected { reason: String },
    /// An animation or deferred step needs another host frame.
    FrameRequested,
    RenderNeeded,
}

/// Orchestrates input, the device registry and the transform engine.
pub struct CanvasController<C: ConnectionManager> {
    pub registry: DeviceRegistry,
    pub transform: TransformEngine,
    pub connections: C,
    pub input: InputState,
    pub state: SharedState,
    config: CanvasConfig,
    clock_ms: f64,
    last_scroll: Point,
}

impl<C: ConnectionManager> CanvasController<C> {
    #[must_use]
    pub fn new(catalog: DeviceCatalog, connections: C, config: CanvasConfig) -> Self {
        Self {
            registry: DeviceRegistry::with_default_size(catalog, config.device_size),
            transform: TransformEngine::new(&config),
            connections,
            input: InputState::Idle,
            state: SharedState::default(),
            config,
            clock_ms: 0.0,
            last_scroll: Point::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Timestamp of the last frame seen, in milliseconds.
    #[must_use]
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    // --- Input dispatch ---

    /// Apply one host event and return what the host must do about it.
    pub fn dispatch(&mut self, event: InputEvent) -> Vec<Action> {
        let mut actions = Vec::new();
        match event {
            InputEvent::PointerDown { at, button, modifiers } => self.on_pointer_down(at, button, modifiers, &mut actions),
            InputEvent::PointerMove { at, .. } => self.on_pointer_move(at, &mut actions),
            InputEvent::PointerUp { at, .. } => self.on_pointer_up(at, &mut actions),
            InputEvent::PointerLeave => self.on_pointer_leave(&mut actions),
            InputEvent::Wheel { at, delta, modifiers } => self.on_wheel(at, delta, modifiers),
            InputEvent::KeyDown { key, modifiers } => self.on_key_down(&key, modifiers),
            InputEvent::Resize { left, top, width, height } => {
                let host = (width > 0.0 && height > 0.0).then(|| HostViewport::new(left, top, width, height));
                self.transform.set_host(host);
            }
            InputEvent::MinimapResize { width, height } => {
                let surface = (width > 0.0 && height > 0.0).then(|| MinimapSurface::new(width, height));
                self.transform.set_minimap_surface(surface);
            }
            InputEvent::MinimapClick { at } => {
                if let Some(target) = self.transform.minimap_to_canvas(at) {
                    self.transform.animate_center_on(target, self.config.animation_ms);
                }
            }
            InputEvent::Frame { now_ms } => {
                self.clock_ms = now_ms;
                self.transform.tick(now_ms);
            }
        }
        self.flush(actions)
    }

    fn on_pointer_down(&mut self, at: Point, button: Button, modifiers: Modifiers, actions: &mut Vec<Action>) {
        if !matches!(self.input, InputState::Idle) {
            return;
        }
        if self.transform.pan_start(at, button, modifiers) {
            self.input = InputState::Panning;
            actions.push(Action::SetCursor { cursor: "grabbing" });
            return;
        }
        if button != Button::Primary {
            return;
        }
        let Some(canvas) = self.transform.screen_to_canvas(at) else {
            return;
        };

        let hit = self.registry.get_device_at(canvas).map(|d| (d.id.clone(), d.selected));
        let Some((id, was_selected)) = hit else {
            self.input = InputState::Selecting { start_client: at, start_canvas: canvas, additive: modifiers.shift };
            return;
        };

        if modifiers.shift && was_selected {
            if let Err(e) = self.registry.deselect_device(&id) {
                debug!(error = %e, "pointer-down deselect failed");
            }
            return;
        }
        if !was_selected {
            if let Err(e) = self.registry.select_device(&id, modifiers.shift) {
                debug!(error = %e, "pointer-down selection failed");
                return;
            }
        }

        let origins: Vec<(DeviceId, Point)> =
            self.registry.get_selected_devices().into_iter().map(|d| (d.id.clone(), d.position())).collect();
        if !origins.is_empty() {
            self.input = InputState::DraggingDevices { anchor_canvas: canvas, origins, moved: false };
            actions.push(Action::SetCursor { cursor: "move" });
        }
    }

    fn on_pointer_move(&mut self, at: Point, actions: &mut Vec<Action>) {
        match &mut self.input {
            InputState::Idle => {}
            InputState::Panning => {
                self.transform.pan_move(at);
            }
            InputState::DraggingDevices { anchor_canvas, origins, moved } => {
                let Some(canvas) = self.transform.screen_to_canvas(at) else {
                    return;
                };
                let dx = canvas.x - anchor_canvas.x;
                let dy = canvas.y - anchor_canvas.y;
                *moved = true;
                for (id, origin) in origins.iter() {
                    if let Err(e) = self.registry.move_device(id, origin.x + dx, origin.y + dy, &mut self.connections) {
                        debug!(error = %e, "drag skipped device");
                    }
                }
            }
            InputState::Selecting { start_canvas, .. } => {
                if let Some(canvas) = self.transform.screen_to_canvas(at) {
                    actions.push(Action::SelectionBand { rect: Rect::from_corners(*start_canvas, canvas) });
                }
            }
        }
    }

    fn on_pointer_up(&mut self, at: Point, actions: &mut Vec<Action>) {
        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::DraggingDevices { origins, moved, .. } => {
                if moved {
                    debug!(count = origins.len(), "drag finished");
                }
            }
            InputState::Panning => {
                self.transform.pan_end();
            }
            InputState::Selecting { start_client, start_canvas, additive } => {
                let travel = (at.x - start_client.x).hypot(at.y - start_client.y);
                let end_canvas = self.transform.screen_to_canvas(at);
                match end_canvas {
                    Some(end) if travel > CLICK_SLOP_PX => {
                        let n = self.registry.select_in_area(start_canvas.x, start_canvas.y, end.x, end.y, additive);
                        debug!(selected = n, "rubber-band selection");
                    }
                    _ => {
                        if !additive {
                            self.registry.clear_selection();
                        }
                    }
                }
            }
        }
        actions.push(Action::SetCursor { cursor: "default" });
    }

    fn on_pointer_leave(&mut self, actions: &mut Vec<Action>) {
        if matches!(self.input, InputState::Idle) {
            return;
        }
        self.transform.pan_end();
        self.input = InputState::Idle;
        actions.push(Action::SetCursor { cursor: "default" });
    }

    fn on_wheel(&mut self, at: Point, delta: WheelDelta, modifiers: Modifiers) {
        if modifiers.command() {
            if delta.dy == 0.0 {
                return;
            }
            let step = self.config.wheel_zoom_step;
            let factor = if delta.dy < 0.0 { step } else { 1.0 / step };
            self.transform.zoom_to_point(self.transform.zoom() * factor, at);
        } else {
            self.transform.scroll_by(delta.dx, delta.dy);
        }
    }

    fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) {
        match key.as_str() {
            "+" | "=" => {
                self.transform.zoom_in();
            }
            "-" | "_" => {
                self.transform.zoom_out();
            }
            "0" => {
                self.transform.reset_zoom();
            }
            "f" | "F" if !modifiers.command() => {
                self.transform.fit_to_content(self.registry.bodies());
            }
            "a" | "A" if modifiers.command() => {
                self.registry.select_all();
            }
            "Delete" | "Backspace" => {
                let removed = self.registry.delete_selected(&mut self.connections);
                debug!(count = removed.len(), "deleted selection");
            }
            "Escape" => {
                self.registry.clear_selection();
            }
            "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" => self.nudge_selection(key.as_str(), modifiers),
            other => debug!(key = other, "unbound key"),
        }
    }

    fn nudge_selection(&mut self, key: &str, modifiers: Modifiers) {
        let step = if modifiers.shift { NUDGE_STEP_FINE } else { NUDGE_STEP };
        let (dx, dy) = match key {
            "ArrowLeft" => (-step, 0.0),
            "ArrowRight" => (step, 0.0),
            "ArrowUp" => (0.0, -step),
            _ => (0.0, step),
        };
        let targets: Vec<(DeviceId, Point)> =
            self.registry.get_selected_devices().into_iter().map(|d| (d.id.clone(), d.position())).collect();
        for (id, p) in targets {
            if let Err(e) = self.registry.move_device(&id, p.x + dx, p.y + dy, &mut self.connections) {
                debug!(error = %e, "nudge skipped device");
            }
        }
    }

    // --- Entity requests ---

    /// Place a device at canvas position `(x, y)`.
    pub fn create_device(&mut self, type_key: &str, x: f64, y: f64, overrides: DeviceOverrides) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Err(e) = validate_overrides(&overrides) {
            actions.push(Action::Rejected { reason: e.to_string() });
            return self.flush(actions);
        }
        if let Err(e) = self.registry.create_device(type_key, x, y, overrides) {
            actions.push(Action::Rejected { reason: e.to_string() });
        }
        self.flush(actions)
    }

    /// Place a device dropped at client point `at`, centered under the pointer.
    pub fn drop_device(&mut self, type_key: &str, at: Point, overrides: DeviceOverrides) -> Vec<Action> {
        let Some(canvas) = self.transform.screen_to_canvas(at) else {
            warn!(type_key, "drop before the display area exists");
            return vec![Action::Rejected { reason: "display area unavailable".to_string() }];
        };
        let w = overrides.width.unwrap_or(self.config.device_size);
        let h = overrides.height.unwrap_or(self.config.device_size);
        self.create_device(type_key, canvas.x - w / 2.0, canvas.y - h / 2.0, overrides)
    }

    pub fn update_device(&mut self, id: &DeviceId, update: &DeviceUpdate) -> Vec<Action> {
        let mut actions = Vec::new();
        let result = validate_update(update)
            .map_err(|e| e.to_string())
            .and_then(|()| self.registry.update_device(id, update).map_err(|e| e.to_string()));
        if let Err(reason) = result {
            actions.push(Action::Rejected { reason });
        }
        self.flush(actions)
    }

    pub fn move_device(&mut self, id: &DeviceId, x: f64, y: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Err(e) = self.registry.move_device(id, x, y, &mut self.connections) {
            actions.push(Action::Rejected { reason: e.to_string() });
        }
        self.flush(actions)
    }

    pub fn remove_device(&mut self, id: &DeviceId) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Err(e) = self.registry.remove_device(id, &mut self.connections) {
            actions.push(Action::Rejected { reason: e.to_string() });
        }
        self.flush(actions)
    }

    pub fn select_device(&mut self, id: &DeviceId, multi: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Err(e) = self.registry.select_device(id, multi) {
            actions.push(Action::Rejected { reason: e.to_string() });
        }
        self.flush(actions)
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        self.registry.delete_selected(&mut self.connections);
        self.flush(Vec::new())
    }

    /// Replace every device with `devices` (a project load).
    ///
    /// Records with malformed properties are skipped with a warning.
    pub fn import(&mut self, devices: Vec<Device>) -> Vec<Action> {
        self.state.loading_progress = 0.0;
        self.input = InputState::Idle;
        let devices: Vec<Device> = devices
            .into_iter()
            .filter(|device| match validate_device(device) {
                Ok(()) => true,
                Err(err) => {
                    warn!(id = %device.id, %err, "import skipped invalid device");
                    false
                }
            })
            .collect();
        self.registry.import(devices);
        self.state.loading_progress = 1.0;
        self.flush(Vec::new())
    }

    #[must_use]
    pub fn export(&self) -> Vec<Device> {
        self.registry.export()
    }

    pub fn clear(&mut self) -> Vec<Action> {
        self.input = InputState::Idle;
        self.registry.clear();
        self.flush(Vec::new())
    }

    // --- Navigation requests ---

    pub fn fit_to_content(&mut self) -> Vec<Action> {
        self.transform.fit_to_content(self.registry.bodies());
        self.flush(Vec::new())
    }

    /// Smoothly bring a device's body to the display center.
    pub fn focus_device(&mut self, id: &DeviceId) -> Vec<Action> {
        let Some(center) = self.registry.get(id).map(|d| d.rect().center()) else {
            return vec![Action::Rejected { reason: format!("device not found: {id}") }];
        };
        self.transform.animate_center_on(center, self.config.animation_ms);
        self.flush(Vec::new())
    }

    pub fn animate_scroll_to(&mut self, target: Point, duration_ms: f64) -> Vec<Action> {
        self.transform.animate_scroll_to(target, duration_ms);
        self.flush(Vec::new())
    }

    pub fn center_on(&mut self, target: Point) -> Vec<Action> {
        self.transform.center_on(target);
        self.flush(Vec::new())
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.transform.reset();
        self.flush(Vec::new())
    }

    // --- Output ---

    /// Turn accumulated store events into actions and refresh the shared state.
    fn flush(&mut self, mut actions: Vec<Action>) -> Vec<Action> {
        let mut changed = false;

        for event in self.registry.take_events() {
            changed = true;
            actions.push(match event {
                DeviceEvent::Created(device) => Action::DeviceCreated { device },
                DeviceEvent::Updated(device) => Action::DeviceUpdated { device },
                DeviceEvent::Moved { id, x, y } => Action::DeviceMoved { id, x, y },
                DeviceEvent::Removed(id) => Action::DeviceRemoved { id },
                DeviceEvent::Selected(device) => Action::DeviceSelected { device },
                DeviceEvent::Deselected(id) => Action::DeviceDeselected { id },
                DeviceEvent::SelectionCleared => Action::SelectionCleared,
                DeviceEvent::Imported { count } => Action::DevicesImported { count },
                DeviceEvent::Cleared => Action::Cleared,
            });
        }

        let mut zoom = None;
        let mut indicator = None;
        for event in self.transform.take_events() {
            changed = true;
            match event {
                ViewEvent::ZoomChanged(z) => zoom = Some(z),
                ViewEvent::MinimapUpdated(i) => indicator = Some(i),
            }
        }

        self.state.current_zoom = self.transform.zoom();
        self.state.device_count = self.registry.len();
        self.state.selected_count = self.registry.get_selected_devices().len();

        if let Some(zoom) = zoom {
            actions.push(Action::ZoomChanged { zoom, percent: self.state.zoom_percent() });
        }
        let scroll = self.transform.scroll();
        if scroll != self.last_scroll {
            self.last_scroll = scroll;
            changed = true;
            actions.push(Action::ScrollChanged { scroll });
        }
        if let Some(indicator) = indicator {
            actions.push(Action::MinimapUpdated { indicator });
        }
        if self.transform.needs_frame() {
            actions.push(Action::FrameRequested);
        }
        if changed {
            actions.push(Action::RenderNeeded);
        }
        actions
    }
}
