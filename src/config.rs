//! Canvas configuration parsed from environment variables.

use crate::consts::{ANIMATION_MS, DEVICE_SIZE, FIT_MARGIN, WHEEL_ZOOM_STEP, WORLD_HEIGHT, WORLD_WIDTH, ZOOM_STEP};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    /// Multiplicative step for zoom in / zoom out.
    pub zoom_step: f64,
    /// Multiplicative step per ctrl+wheel notch.
    pub wheel_zoom_step: f64,
    /// Margin kept around content by fit-to-content.
    pub fit_margin: f64,
    /// Default duration of animated navigation, in milliseconds.
    pub animation_ms: f64,
    /// Logical world extent mapped onto the minimap.
    pub world_width: f64,
    pub world_height: f64,
    /// Default device width and height.
    pub device_size: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom_step: ZOOM_STEP,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            fit_margin: FIT_MARGIN,
            animation_ms: ANIMATION_MS,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            device_size: DEVICE_SIZE,
        }
    }
}

impl CanvasConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `NETCANVAS_ZOOM_STEP`: default 1.2
    /// - `NETCANVAS_WHEEL_ZOOM_STEP`: default 1.1
    /// - `NETCANVAS_FIT_MARGIN`: default 50
    /// - `NETCANVAS_ANIMATION_MS`: default 500
    /// - `NETCANVAS_WORLD_WIDTH` / `NETCANVAS_WORLD_HEIGHT`: default 5000
    /// - `NETCANVAS_DEVICE_SIZE`: default 80
    ///
    /// Steps must exceed 1 and sizes must be positive; anything else keeps the default.
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            zoom_step: env_parse_where("NETCANVAS_ZOOM_STEP", d.zoom_step, |v| v > 1.0),
            wheel_zoom_step: env_parse_where("NETCANVAS_WHEEL_ZOOM_STEP", d.wheel_zoom_step, |v| v > 1.0),
            fit_margin: env_parse_where("NETCANVAS_FIT_MARGIN", d.fit_margin, |v| v >= 0.0),
            animation_ms: env_parse_where("NETCANVAS_ANIMATION_MS", d.animation_ms, |v| v >= 0.0),
            world_width: env_parse_where("NETCANVAS_WORLD_WIDTH", d.world_width, |v| v > 0.0),
            world_height: env_parse_where("NETCANVAS_WORLD_HEIGHT", d.world_height, |v| v > 0.0),
            device_size: env_parse_where("NETCANVAS_DEVICE_SIZE", d.device_size, |v| v > 0.0),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_parse_where(key: &str, default: f64, valid: impl Fn(f64) -> bool) -> f64 {
    let value = env_parse(key, default);
    if value.is_finite() && valid(value) {
        value
    } else {
        tracing::warn!(key, value, "ignoring out-of-range config value");
        default
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
