//! Shared numeric constants for the netcanvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplicative step used by zoom in / zoom out.
pub const ZOOM_STEP: f64 = 1.2;

/// Multiplicative step applied per ctrl+wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Fit-to-content never magnifies past 100%.
pub const MAX_FIT_ZOOM: f64 = 1.0;

// ── Layout ──────────────────────────────────────────────────────

/// Margin in canvas units kept around content by fit-to-content.
pub const FIT_MARGIN: f64 = 50.0;

/// Default device body width and height in canvas units.
pub const DEVICE_SIZE: f64 = 80.0;

/// Nudge distance for arrow keys, in canvas units.
pub const NUDGE_STEP: f64 = 10.0;

/// Nudge distance for shift+arrow keys, in canvas units.
pub const NUDGE_STEP_FINE: f64 = 1.0;

/// Pointer travel in screen pixels below which a press counts as a click.
pub const CLICK_SLOP_PX: f64 = 3.0;

// ── Minimap ─────────────────────────────────────────────────────

/// Logical width of the world mapped onto the minimap.
pub const WORLD_WIDTH: f64 = 5000.0;

/// Logical height of the world mapped onto the minimap.
pub const WORLD_HEIGHT: f64 = 5000.0;

// ── Animation ───────────────────────────────────────────────────

/// Default duration of animated navigation, in milliseconds.
pub const ANIMATION_MS: f64 = 500.0;

/// Host frame interval used by the headless driver, in milliseconds.
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Upper bound on frames the headless driver steps before giving up on an animation.
pub const MAX_IDLE_FRAMES: usize = 600;
