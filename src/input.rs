//! Input model: host events, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `InputEvent` is the host-agnostic description of what the user did; the
//! host converts its native events into these and feeds them to
//! [`crate::engine::CanvasController::dispatch`]. `InputState` is the active
//! gesture tracked between pointer-down and pointer-up, carrying whatever
//! context is needed to apply incremental moves without drift.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::doc::DeviceId;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`, `"+"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Middle button, or alt + primary, starts a pan drag.
#[must_use]
pub fn is_pan_trigger(button: Button, modifiers: Modifiers) -> bool {
    match button {
        Button::Middle => true,
        Button::Primary => modifiers.alt,
        Button::Secondary => false,
    }
}

/// One host event, already stripped of host-specific detail.
///
/// Pointer positions are client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown {
        at: Point,
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        at: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        at: Point,
        button: Button,
    },
    /// The pointer left the display area.
    PointerLeave,
    Wheel {
        at: Point,
        delta: WheelDelta,
        #[serde(default)]
        modifiers: Modifiers,
    },
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// The host display area moved or changed size.
    Resize {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    /// The minimap surface was attached or changed size.
    MinimapResize {
        width: f64,
        height: f64,
    },
    /// A click on the minimap, in minimap-local pixels.
    MinimapClick {
        at: Point,
    },
    /// A host display refresh, carrying the frame clock in milliseconds.
    Frame {
        now_ms: f64,
    },
}

/// The gesture currently in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The transform engine owns a pan drag.
    Panning,
    /// Selected devices follow the pointer.
    DraggingDevices {
        /// Canvas position of the pointer at pointer-down.
        anchor_canvas: Point,
        /// Each dragged device with its position at pointer-down.
        origins: Vec<(DeviceId, Point)>,
        /// Whether any move has been applied yet.
        moved: bool,
    },
    /// Rubber-band selection over empty canvas.
    Selecting {
        /// Client position of the pointer at pointer-down.
        start_client: Point,
        /// Canvas position of the pointer at pointer-down.
        start_canvas: Point,
        /// Add to the existing selection instead of replacing it.
        additive: bool,
    },
}
