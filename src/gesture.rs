//! Raw-touch bookkeeping: per-session accumulators, double-tap
//! detection and cancellable deadline timers.
//!
//! Timers here are polled deadlines, not callbacks. They are driven
//! from the host's tick loop, and cancelling one simply drops the
//! deadline, so a timer can never fire for a session that has ended.

use std::time::{Duration, Instant};

use iced::Point;

/// Window within which a second touch-down counts as a double tap.
pub const DOUBLE_TAP_MS: u64 = 250;

/// Hold time before a stationary touch becomes a long press.
pub const LONG_PRESS_MS: u64 = 800;

/// Accumulated movement beyond which a pending long press is cancelled.
pub const MOVE_CANCEL_PX: f32 = 5.0;

/// A touch (or synthesized mouse) event in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: Phase,
    pub finger: u64,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Down,
    Move,
    Up,
}

/// Cancellable deadline timer, polled from the tick loop.
#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn start(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first poll at or past the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Two touch-downs within [`DOUBLE_TAP_MS`], with at most one
/// simultaneous touch point, make a double tap.
#[derive(Debug, Default)]
pub struct DoubleTapTracker {
    last_down: Option<Instant>,
}

impl DoubleTapTracker {
    /// Record a touch-down and report whether it completes a double
    /// tap. `touches` is the number of active fingers including this
    /// one. A detected double tap clears the tracker so a third tap
    /// starts a fresh pair.
    pub fn register(&mut self, now: Instant, touches: usize) -> bool {
        let double = touches <= 1
            && self.last_down.is_some_and(|at| {
                now.duration_since(at) <= Duration::from_millis(DOUBLE_TAP_MS)
            });
        self.last_down = if double { None } else { Some(now) };
        double
    }
}

/// Accumulators for one continuous interaction, first finger down to
/// last finger up. Constructed fresh on every first touch-down so a
/// move event can never observe stale state.
#[derive(Debug, Default)]
pub struct Session {
    /// Last single-finger position. None until the first move has been
    /// processed; a None is treated as a zero delta, never a jump.
    pub last_position: Option<Point>,
    /// Finger distance on the previous pinch step.
    pub last_pinch_distance: Option<f32>,
    /// Pinch midpoint offset from the viewport centre, captured when
    /// the second finger lands.
    pub pinch_focal: Option<(f32, f32)>,
    /// Accumulated absolute movement, for the long-press cutoff.
    pub moved_x: f32,
    pub moved_y: f32,
    /// Elastic overflow past the pan bounds (screen px, capped).
    pub overflow_x: f32,
    pub overflow_y: f32,
    /// This session was classified as a double tap; all further gesture
    /// processing for it is short-circuited.
    pub is_double_tap: bool,
    /// The long-press timer fired for this session; pan and dismiss
    /// resolution are suppressed.
    pub is_long_press: bool,
}

impl Session {
    /// Incremental delta from the last recorded position, updating the
    /// movement accumulators.
    pub fn pan_delta(&mut self, position: Point) -> (f32, f32) {
        let delta = match self.last_position {
            Some(last) => (position.x - last.x, position.y - last.y),
            None => (0.0, 0.0),
        };
        self.last_position = Some(position);
        self.moved_x += delta.0.abs();
        self.moved_y += delta.1.abs();
        delta
    }

    /// Incremental change in pinch distance; the first sample of a
    /// pinch yields zero.
    pub fn pinch_delta(&mut self, distance: f32) -> f32 {
        let diff = match self.last_pinch_distance {
            Some(last) => distance - last,
            None => 0.0,
        };
        self.last_pinch_distance = Some(distance);
        diff
    }

    pub fn exceeded_move_threshold(&self) -> bool {
        self.moved_x > MOVE_CANCEL_PX || self.moved_y > MOVE_CANCEL_PX
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_has_null_positions() {
        let session = Session::default();
        assert!(session.last_position.is_none());
        assert!(session.last_pinch_distance.is_none());
        assert!(!session.is_double_tap);
        assert!(!session.is_long_press);
    }

    #[test]
    fn first_move_is_zero_delta() {
        let mut session = Session::default();
        let delta = session.pan_delta(Point::new(300.0, 500.0));
        assert_eq!(delta, (0.0, 0.0));
        // Second move produces the real delta.
        let delta = session.pan_delta(Point::new(310.0, 495.0));
        assert_eq!(delta, (10.0, -5.0));
    }

    #[test]
    fn first_pinch_sample_is_zero_diff() {
        let mut session = Session::default();
        assert_eq!(session.pinch_delta(100.0), 0.0);
        assert_eq!(session.pinch_delta(140.0), 40.0);
    }

    #[test]
    fn movement_accumulates_absolutely() {
        let mut session = Session::default();
        session.pan_delta(Point::new(0.0, 0.0));
        session.pan_delta(Point::new(3.0, 0.0));
        session.pan_delta(Point::new(0.0, 0.0));
        assert!(session.exceeded_move_threshold());
    }

    #[test]
    fn timer_fires_once_at_deadline() {
        let now = Instant::now();
        let mut timer = Timer::default();
        timer.start(now, Duration::from_millis(800));
        assert!(timer.is_pending());
        assert!(!timer.fire(now + Duration::from_millis(799)));
        assert!(timer.fire(now + Duration::from_millis(800)));
        assert!(!timer.is_pending());
        assert!(!timer.fire(now + Duration::from_millis(900)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let now = Instant::now();
        let mut timer = Timer::default();
        timer.start(now, Duration::from_millis(800));
        timer.cancel();
        assert!(!timer.fire(now + Duration::from_secs(10)));
    }

    #[test]
    fn double_tap_within_window() {
        let now = Instant::now();
        let mut tracker = DoubleTapTracker::default();
        assert!(!tracker.register(now, 1));
        assert!(tracker.register(now + Duration::from_millis(200), 1));
    }

    #[test]
    fn slow_second_tap_is_not_double() {
        let now = Instant::now();
        let mut tracker = DoubleTapTracker::default();
        assert!(!tracker.register(now, 1));
        assert!(!tracker.register(now + Duration::from_millis(300), 1));
    }

    #[test]
    fn multi_finger_down_is_not_double() {
        let now = Instant::now();
        let mut tracker = DoubleTapTracker::default();
        assert!(!tracker.register(now, 1));
        assert!(!tracker.register(now + Duration::from_millis(100), 2));
    }

    #[test]
    fn double_tap_detection_resets_the_pair() {
        let now = Instant::now();
        let mut tracker = DoubleTapTracker::default();
        tracker.register(now, 1);
        assert!(tracker.register(now + Duration::from_millis(100), 1));
        // Third tap shortly after starts a new pair, not a triple.
        assert!(!tracker.register(now + Duration::from_millis(200), 1));
    }
}
