//! The gesture-driven lightbox controller.
//!
//! One [`ModalState`] owns everything a full-screen viewer overlay
//! needs: the open/closed state and box morph, the live
//! scale/translation transform, the per-interaction gesture session,
//! and the swipe-to-dismiss tracker. Raw touch events go in through
//! [`ModalState::touch`]; the host polls [`ModalState::tick`] from its
//! frame loop to advance animations, fire the long-press timer and run
//! the deferred open/close steps.
//!
//! Everything runs on the UI thread; a viewer instance shares no state
//! with any other.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use iced::{Point, Rectangle, Size};

use crate::animator::{morph_frame, TransformTween, Tween};
use crate::dismiss::Dismiss;
use crate::gesture::{
    self, DoubleTapTracker, Phase, Session, Timer, TouchEvent, LONG_PRESS_MS,
};
use crate::transform::{self, PanAxis, Transform};

/// Deferred one-tick action. Opening reveals the overlay only after the
/// origin measurement has been committed; closing hides it only after
/// the inline thumbnail's opacity has been restored. Both avoid a
/// one-frame flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Reveal,
    Hide,
}

#[derive(Debug)]
pub struct ModalState {
    is_open: bool,
    /// Inline thumbnail rectangle in window coordinates. Kept across
    /// failed measurements so the morph never interpolates from an
    /// undefined frame.
    origin: Rectangle,
    viewport: Size,
    source: Option<PathBuf>,
    transform: Transform,
    session: Session,
    fingers: HashMap<u64, Point>,
    double_tap: DoubleTapTracker,
    long_press: Timer,
    dismiss: Dismiss,
    /// In-flight settle/zoom animation; `transform` is committed to its
    /// target when it finishes.
    settle: Option<TransformTween>,
    /// Open/close box-morph progress animation.
    morph: Option<Tween>,
    /// Backdrop fading back to opaque after an abandoned dismiss drag.
    backdrop: Option<Tween>,
    /// Morph progress at rest: 0.0 closed, 1.0 open.
    progress: f32,
    thumb_opacity: f32,
    pending: Option<Pending>,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            is_open: false,
            origin: Rectangle::new(Point::ORIGIN, Size::ZERO),
            viewport: Size::ZERO,
            source: None,
            transform: Transform::identity(),
            session: Session::default(),
            fingers: HashMap::new(),
            double_tap: DoubleTapTracker::default(),
            long_press: Timer::default(),
            dismiss: Dismiss::default(),
            settle: None,
            morph: None,
            backdrop: None,
            progress: 0.0,
            thumb_opacity: 1.0,
            pending: None,
        }
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// The overlay should still be rendered while the closing morph
    /// plays out.
    pub fn is_visible(&self) -> bool {
        self.is_open || self.morph.is_some() || self.pending == Some(Pending::Hide)
    }

    /// Whether the host needs to keep its tick subscription running.
    pub fn is_animating(&self) -> bool {
        self.settle.is_some()
            || self.morph.is_some()
            || self.backdrop.is_some()
            || self.pending.is_some()
            || self.long_press.is_pending()
    }

    /// Opacity for the inline thumbnail; zero while the overlay has
    /// visually replaced it.
    pub fn thumb_opacity(&self) -> f32 {
        self.thumb_opacity
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Store a fresh origin measurement. `None` (element not laid out
    /// yet) keeps the previous frame.
    pub fn update_origin(&mut self, frame: Option<Rectangle>) {
        if let Some(frame) = frame {
            self.origin = frame;
        }
    }

    /// Switch the displayed source. A change resets the transform and
    /// any in-flight gesture.
    pub fn set_source(&mut self, source: Option<PathBuf>) {
        if self.source == source {
            return;
        }
        self.source = source;
        self.transform = Transform::identity();
        self.session = Session::default();
        self.settle = None;
        self.long_press.cancel();
        self.dismiss.reset();
    }

    /// Open the overlay from the given measured thumbnail frame. The
    /// reveal itself happens on the next tick.
    pub fn open(&mut self, frame: Option<Rectangle>) {
        if self.is_open {
            return;
        }
        self.update_origin(frame);
        self.thumb_opacity = 0.0;
        self.pending = Some(Pending::Reveal);
    }

    /// Restore the inline thumbnail and hide the overlay on the next
    /// tick.
    pub fn close(&mut self) {
        if !self.is_open && self.pending != Some(Pending::Reveal) {
            return;
        }
        self.thumb_opacity = 1.0;
        self.pending = Some(Pending::Hide);
    }

    /// Advance animations, run deferred open/close steps and fire the
    /// long-press timer. Call from the host's frame tick.
    pub fn tick(&mut self, now: Instant) {
        match self.pending.take() {
            Some(Pending::Reveal) => {
                self.is_open = true;
                self.morph = Some(Tween::new(self.progress, 1.0, now));
            }
            Some(Pending::Hide) => {
                self.is_open = false;
                self.morph = Some(Tween::new(self.progress, 0.0, now));
            }
            None => {}
        }

        if let Some(morph) = self.morph {
            self.progress = morph.value(now);
            if morph.is_done(now) {
                self.progress = morph.to;
                self.morph = None;
                if self.progress == 0.0 {
                    self.reset_interaction();
                }
            }
        }

        if let Some(settle) = self.settle {
            if settle.is_done(now) {
                self.transform = settle.to;
                self.settle = None;
            }
        }

        if let Some(backdrop) = self.backdrop {
            if backdrop.is_done(now) {
                self.backdrop = None;
            }
        }

        // The long-press only counts while its session is still active.
        if self.long_press.fire(now) && !self.fingers.is_empty() && !self.session.is_double_tap {
            self.session.is_long_press = true;
        }
    }

    /// Feed one raw touch event into the gesture pipeline.
    pub fn touch(&mut self, event: TouchEvent, now: Instant) {
        if !self.is_open {
            return;
        }
        match event.phase {
            Phase::Down => self.touch_down(event.finger, event.position, now),
            Phase::Move => self.touch_move(event.finger, event.position),
            Phase::Up => self.touch_up(event.finger, now),
        }
    }

    /// Current on-screen rectangle for the overlay image, morphing
    /// between the origin frame and the full viewport.
    pub fn frame(&self, now: Instant) -> Rectangle {
        let progress = match self.morph {
            Some(morph) => morph.value(now),
            None => self.progress,
        };
        morph_frame(self.origin, self.viewport, progress)
    }

    /// Current transform including any in-flight settle animation and
    /// the damped elastic overflow.
    pub fn transform_now(&self, now: Instant) -> Transform {
        if let Some(settle) = self.settle {
            return settle.value(now);
        }
        let t = self.transform;
        Transform {
            scale: t.scale,
            translate_x: transform::visible_translate(
                PanAxis {
                    translate: t.translate_x,
                    overflow: self.session.overflow_x,
                },
                t.scale,
            ),
            translate_y: transform::visible_translate(
                PanAxis {
                    translate: t.translate_y,
                    overflow: self.session.overflow_y,
                },
                t.scale,
            ),
        }
    }

    /// Backdrop opacity: follows the dismiss drag while it is live,
    /// animates back to opaque after an abandoned drag.
    pub fn backdrop_opacity(&self, now: Instant) -> f32 {
        if let Some(backdrop) = self.backdrop {
            return backdrop.value(now);
        }
        self.dismiss.backdrop_opacity()
    }

    fn touch_down(&mut self, finger: u64, position: Point, now: Instant) {
        let first = self.fingers.is_empty();
        self.fingers.insert(finger, position);

        if first {
            // Commit any in-flight settle so the finger takes over from
            // the current visual state, then start a fresh session.
            self.transform = self.transform_now(now);
            self.settle = None;
            self.backdrop = None;
            self.session = Session::default();
            self.dismiss.reset();
            self.long_press.cancel();

            if self.double_tap.register(now, self.fingers.len()) {
                self.session.is_double_tap = true;
                let target = transform::double_tap_target(
                    self.transform,
                    self.focal_of(position),
                    (self.viewport.width, self.viewport.height),
                );
                self.settle = Some(TransformTween::new(self.transform, target, now));
            } else {
                self.long_press.start(now, Duration::from_millis(LONG_PRESS_MS));
            }
        } else {
            // Second finger: a pinch begins. Drop single-finger
            // bookkeeping, seed the starting distance and capture the
            // focal midpoint.
            self.long_press.cancel();
            self.session.last_position = None;
            if self.fingers.len() == 2 {
                let points: Vec<Point> = self.fingers.values().copied().collect();
                self.session.last_pinch_distance =
                    Some(gesture::distance(points[0], points[1]));
                let mid = gesture::midpoint(points[0], points[1]);
                self.session.pinch_focal = Some(self.focal_of(mid));
            }
        }
    }

    fn touch_move(&mut self, finger: u64, position: Point) {
        if !self.fingers.contains_key(&finger) {
            return;
        }
        self.fingers.insert(finger, position);
        if self.session.is_double_tap || self.session.is_long_press {
            return;
        }

        match self.fingers.len() {
            1 => {
                let (dx, dy) = self.session.pan_delta(position);
                if self.session.exceeded_move_threshold() {
                    self.long_press.cancel();
                }
                self.apply_pan(dx, dy);
            }
            2 => {
                let points: Vec<Point> = self.fingers.values().copied().collect();
                let dist = gesture::distance(points[0], points[1]);
                let diff = self.session.pinch_delta(dist);
                let focal = self.session.pinch_focal.unwrap_or((0.0, 0.0));
                self.transform = transform::resolve_pinch(self.transform, diff, focal);
            }
            // Three or more fingers: hold still until the count drops.
            _ => {}
        }
    }

    fn apply_pan(&mut self, dx: f32, dy: f32) {
        let t = self.transform;

        let axis = transform::resolve_pan(
            PanAxis {
                translate: t.translate_x,
                overflow: self.session.overflow_x,
            },
            dx,
            t.scale,
            self.viewport.width,
        );
        self.transform.translate_x = axis.translate;
        self.session.overflow_x = axis.overflow;

        if t.is_unzoomed() {
            // Unzoomed vertical drag feeds the dismiss detector and
            // moves the image directly, unclamped.
            self.dismiss.update(dy);
            self.transform.translate_y = self.dismiss.drag();
        } else {
            let axis = transform::resolve_pan(
                PanAxis {
                    translate: t.translate_y,
                    overflow: self.session.overflow_y,
                },
                dy,
                t.scale,
                self.viewport.height,
            );
            self.transform.translate_y = axis.translate;
            self.session.overflow_y = axis.overflow;
        }
    }

    fn touch_up(&mut self, finger: u64, now: Instant) {
        if self.fingers.remove(&finger).is_none() {
            return;
        }
        if !self.fingers.is_empty() {
            // A pinch degraded to one finger; restart single-touch
            // tracking from the remaining finger's next move.
            self.session.last_position = None;
            self.session.last_pinch_distance = None;
            return;
        }

        self.long_press.cancel();
        if self.session.is_double_tap || self.session.is_long_press {
            self.dismiss.reset();
            return;
        }
        self.resolve_release(now);
    }

    fn resolve_release(&mut self, now: Instant) {
        let t = self.transform;

        if t.is_unzoomed() && self.dismiss.should_close() {
            self.dismiss.reset();
            self.close();
            return;
        }

        // Animate from the visible state (including elastic overflow)
        // to the clamped resting state.
        let from = self.transform_now(now);
        self.session.overflow_x = 0.0;
        self.session.overflow_y = 0.0;

        // The drag can be non-zero on a zoomed release too, when a
        // pinch joined partway through an unzoomed drag.
        if self.dismiss.drag() != 0.0 {
            let opacity = self.dismiss.backdrop_opacity();
            self.dismiss.reset();
            self.backdrop = Some(Tween::new(opacity, 1.0, now));
        }

        let target = transform::settle(t, (self.viewport.width, self.viewport.height));
        if from != target {
            self.settle = Some(TransformTween::new(from, target, now));
        }
        self.transform = target;
    }

    fn reset_interaction(&mut self) {
        self.transform = Transform::identity();
        self.session = Session::default();
        self.settle = None;
        self.backdrop = None;
        self.dismiss.reset();
        self.long_press.cancel();
        self.fingers.clear();
    }

    fn focal_of(&self, position: Point) -> (f32, f32) {
        (
            position.x - self.viewport.width / 2.0,
            position.y - self.viewport.height / 2.0,
        )
    }
}
