//! Shared application state.
//!
//! DESIGN
//! ======
//! `SharedState` is the snapshot the host's widgets read: the zoom
//! percentage display, the status bar counts and the loading indicator.
//! The controller refreshes it after every dispatch; nothing else writes it.

use serde::Serialize;

/// Host-visible mirror of controller state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    /// Current zoom factor (1.0 = 100%).
    pub current_zoom: f64,
    /// Progress of the current import, `0.0..=1.0`. 1.0 when idle.
    pub loading_progress: f64,
    /// Number of devices in the registry.
    pub device_count: usize,
    /// Number of selected devices.
    pub selected_count: usize,
}

impl Default for SharedState {
    fn default() -> Self {
        Self { current_zoom: 1.0, loading_progress: 1.0, device_count: 0, selected_count: 0 }
    }
}

impl SharedState {
    /// Zoom as a whole percentage for display.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (self.current_zoom * 100.0).round() as u32;
        percent
    }
}
