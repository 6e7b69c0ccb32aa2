//! Instant-based timing animations and the thumbnail-to-fullscreen
//! box morph.

use std::time::{Duration, Instant};

use iced::{Rectangle, Size};

use crate::transform::Transform;

/// Length of the settle, zoom and morph timing animations.
pub const ANIM_MS: u64 = 100;

fn anim_duration() -> Duration {
    Duration::from_millis(ANIM_MS)
}

/// A value animating linearly from `from` to `to` over [`ANIM_MS`].
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    start: Instant,
}

impl Tween {
    pub fn new(from: f32, to: f32, now: Instant) -> Self {
        Self { from, to, start: now }
    }

    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        (elapsed / anim_duration().as_secs_f32()).min(1.0)
    }

    pub fn value(&self, now: Instant) -> f32 {
        self.from + (self.to - self.from) * self.progress(now)
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// A whole transform animating between two states, used to settle the
/// image after a release and to animate double-tap zooms.
#[derive(Debug, Clone, Copy)]
pub struct TransformTween {
    pub from: Transform,
    pub to: Transform,
    start: Instant,
}

impl TransformTween {
    pub fn new(from: Transform, to: Transform, now: Instant) -> Self {
        Self { from, to, start: now }
    }

    fn progress(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        (elapsed / anim_duration().as_secs_f32()).min(1.0)
    }

    pub fn value(&self, now: Instant) -> Transform {
        let p = self.progress(now);
        let lerp = |a: f32, b: f32| a + (b - a) * p;
        Transform {
            scale: lerp(self.from.scale, self.to.scale),
            translate_x: lerp(self.from.translate_x, self.to.translate_x),
            translate_y: lerp(self.from.translate_y, self.to.translate_y),
        }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Interpolate the lightbox frame between the inline thumbnail's
/// window-space rectangle at progress 0 and the full viewport at
/// progress 1.
pub fn morph_frame(origin: Rectangle, viewport: Size, progress: f32) -> Rectangle {
    let p = progress.clamp(0.0, 1.0);
    Rectangle {
        x: origin.x * (1.0 - p),
        y: origin.y * (1.0 - p),
        width: origin.width + (viewport.width - origin.width) * p,
        height: origin.height + (viewport.height - origin.height) * p,
    }
}
