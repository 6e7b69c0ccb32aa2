//! Swipe-to-close detection for the unzoomed lightbox.
//!
//! Active only while exactly one finger is down and the image sits at
//! 1x. The vertical drag total doubles as the image's translation and
//! drives the backdrop fade; releasing past the threshold closes the
//! viewer.

/// Vertical drag (px) past which a release closes the viewer.
pub const DISMISS_THRESHOLD: f32 = 150.0;

/// Drag distance over which the backdrop fades from opaque to its floor.
const FADE_RANGE: f32 = 400.0;
const FADE_FLOOR: f32 = 0.2;

#[derive(Debug, Default)]
pub struct Dismiss {
    drag: f32,
}

impl Dismiss {
    pub fn update(&mut self, dy: f32) {
        self.drag += dy;
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Backdrop opacity for the current drag: fully opaque at rest,
    /// approaching the floor as the image is pulled away.
    pub fn backdrop_opacity(&self) -> f32 {
        1.0 - (self.drag.abs() / FADE_RANGE).min(1.0) * (1.0 - FADE_FLOOR)
    }

    pub fn should_close(&self) -> bool {
        self.drag.abs() > DISMISS_THRESHOLD
    }

    pub fn reset(&mut self) {
        self.drag = 0.0;
    }
}
