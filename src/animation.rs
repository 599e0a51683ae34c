//! Animated scroll transitions.
//!
//! An animation is plain data: start and target scroll offsets, a start
//! timestamp and a duration. The host's frame scheduler supplies timestamps
//! (milliseconds, as a `requestAnimationFrame` callback would) and the
//! transform engine steps the animation once per frame. The clock starts at
//! the first frame that steps the animation.

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

use crate::camera::Point;

/// Ease-out cubic: fast start, gentle arrival. `t` is clamped to `[0, 1]`.
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// One frame of an in-flight scroll animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStep {
    /// Scroll offsets for this frame.
    pub scroll: Point,
    /// True once the animation has reached its target.
    pub finished: bool,
}

/// An in-flight scroll animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimation {
    pub from: Point,
    pub to: Point,
    /// Frame time of the first step. `None` until the animation is first stepped.
    pub started_ms: Option<f64>,
    pub duration_ms: f64,
}

impl ScrollAnimation {
    #[must_use]
    pub fn new(from: Point, to: Point, duration_ms: f64) -> Self {
        Self { from, to, started_ms: None, duration_ms }
    }

    /// Linear progress in `[0, 1]` at `now_ms`. Non-positive durations finish immediately.
    ///
    /// An animation that has not been stepped yet is at 0.
    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 || !self.duration_ms.is_finite() {
            return 1.0;
        }
        let Some(started) = self.started_ms else {
            return 0.0;
        };
        ((now_ms - started) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Advance to `now_ms`, starting the clock on the first call.
    ///
    /// The final step lands exactly on the target.
    pub fn step(&mut self, now_ms: f64) -> AnimationStep {
        if self.started_ms.is_none() {
            self.started_ms = Some(now_ms);
        }
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return AnimationStep { scroll: self.to, finished: true };
        }
        let eased = ease_out_cubic(progress);
        AnimationStep {
            scroll: Point {
                x: self.from.x + (self.to.x - self.from.x) * eased,
                y: self.from.y + (self.to.y - self.from.y) * eased,
            },
            finished: false,
        }
    }
}
