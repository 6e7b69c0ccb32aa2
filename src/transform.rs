//! Scale/translation state for the lightbox image and the clamping math
//! that keeps it on screen.
//!
//! Translation is stored in pre-scale (image) coordinates: the on-screen
//! offset of the image centre is `translate * scale`. With that
//! convention the pan bound is `(scale * extent - extent) / 2 / scale`
//! on each axis.

pub const MIN_SCALE: f32 = 0.6;
pub const MAX_SCALE: f32 = 10.0;

/// Scale applied by a double tap on an unzoomed image.
pub const DOUBLE_TAP_SCALE: f32 = 2.0;

/// Finger-distance change (px) per 1.0 of scale change during a pinch.
pub const PINCH_SENSITIVITY: f32 = 200.0;

/// Cap on the elastic overflow counter per axis (screen px).
pub const OVERFLOW_MAX: f32 = 100.0;

/// Fraction of the overflow counter that shows up as visible
/// displacement, giving soft resistance past the pan bound.
const OVERFLOW_DAMPING: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    /// True at exactly 1x. The dismiss detector only runs here.
    pub fn is_unzoomed(&self) -> bool {
        (self.scale - 1.0).abs() < 1e-3
    }
}

/// Maximum |translate| (image coordinates) on an axis whose viewport
/// extent is `extent`. Zero while the scaled image still fits.
pub fn pan_bound(scale: f32, extent: f32) -> f32 {
    let scale = scale.max(MIN_SCALE);
    if scale * extent > extent {
        (scale * extent - extent) / 2.0 / scale
    } else {
        0.0
    }
}

pub fn clamp_axis(translate: f32, scale: f32, extent: f32) -> f32 {
    let bound = pan_bound(scale, extent);
    translate.clamp(-bound, bound)
}

/// Per-axis pan state: the clamped translation plus the elastic
/// overflow accumulated while dragging past the bound.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PanAxis {
    pub translate: f32,
    pub overflow: f32,
}

/// One single-finger pan step on one axis. `delta_px` is the finger
/// movement in screen pixels. Movement past the clamp bound is absorbed
/// into the overflow counter (capped at [`OVERFLOW_MAX`]); movement back
/// toward the bound unwinds the overflow first so the image re-engages
/// the bound without a jump.
pub fn resolve_pan(axis: PanAxis, delta_px: f32, scale: f32, extent: f32) -> PanAxis {
    let scale = scale.max(MIN_SCALE);
    let bound = pan_bound(scale, extent);
    let mut overflow = axis.overflow;
    let mut delta = delta_px / scale;

    if (overflow > 0.0 && delta_px < 0.0) || (overflow < 0.0 && delta_px > 0.0) {
        let unwound = overflow + delta_px;
        if (overflow > 0.0 && unwound > 0.0) || (overflow < 0.0 && unwound < 0.0) {
            return PanAxis {
                translate: axis.translate,
                overflow: unwound,
            };
        }
        // Overflow fully unwound; the remainder moves the image itself.
        delta = unwound / scale;
        overflow = 0.0;
    }

    let proposed = axis.translate + delta;
    let clamped = proposed.clamp(-bound, bound);
    let spill = (proposed - clamped) * scale;
    overflow = (overflow + spill).clamp(-OVERFLOW_MAX, OVERFLOW_MAX);

    PanAxis {
        translate: clamped,
        overflow,
    }
}

/// Translation shown on screen for an axis, including the damped
/// overflow displacement.
pub fn visible_translate(axis: PanAxis, scale: f32) -> f32 {
    axis.translate + axis.overflow * OVERFLOW_DAMPING / scale.max(MIN_SCALE)
}

/// One pinch step: the change in finger distance adjusts the scale and
/// the translation shifts so the content under the pinch midpoint stays
/// put. `focal` is the midpoint offset from the viewport centre in
/// screen pixels. A zero distance change is a no-op.
pub fn resolve_pinch(t: Transform, distance_diff: f32, focal: (f32, f32)) -> Transform {
    let old_scale = t.scale.max(MIN_SCALE);
    let scale = (t.scale + distance_diff / PINCH_SENSITIVITY).clamp(MIN_SCALE, MAX_SCALE);
    if scale == old_scale {
        return Transform { scale, ..t };
    }
    // A screen point p maps to image point p / s - translate; holding
    // the focal point's image coordinate fixed across the scale change
    // gives translate' = translate + p * (1/s' - 1/s).
    Transform {
        scale,
        translate_x: t.translate_x + focal.0 * (1.0 / scale - 1.0 / old_scale),
        translate_y: t.translate_y + focal.1 * (1.0 / scale - 1.0 / old_scale),
    }
}

/// Target transform for a double tap at `focal` (offset from the
/// viewport centre): zoom to 2x centred on the tap point, or back to 1x
/// if already zoomed.
pub fn double_tap_target(t: Transform, focal: (f32, f32), viewport: (f32, f32)) -> Transform {
    if t.scale > 1.0 + 1e-3 {
        return Transform::identity();
    }
    let scale = DOUBLE_TAP_SCALE;
    Transform {
        scale,
        translate_x: clamp_axis(focal.0 * (1.0 / scale - 1.0), scale, viewport.0),
        translate_y: clamp_axis(focal.1 * (1.0 / scale - 1.0), scale, viewport.1),
    }
}

/// Where a released transform should come to rest: scale pulled back up
/// to 1 if the pinch went below it, translation clamped to the bounds
/// at the settled scale.
pub fn settle(t: Transform, viewport: (f32, f32)) -> Transform {
    let scale = if t.scale < 1.0 { 1.0 } else { t.scale };
    Transform {
        scale,
        translate_x: clamp_axis(t.translate_x, scale, viewport.0),
        translate_y: clamp_axis(t.translate_y, scale, viewport.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn pan_bound_is_zero_when_image_fits() {
        assert_eq!(pan_bound(1.0, 400.0), 0.0);
        assert_eq!(pan_bound(0.6, 400.0), 0.0);
    }

    #[test]
    fn pan_bound_formula_when_zoomed() {
        // (2 * 400 - 400) / 2 / 2 = 100
        assert!(approx_eq(pan_bound(2.0, 400.0), 100.0));
    }

    #[test]
    fn clamp_invariant_after_settle() {
        let viewport = (400.0, 800.0);
        for &scale in &[0.6, 1.0, 1.3, 2.0, 5.0, 10.0] {
            for &drag in &[-5000.0, -333.0, -1.0, 0.0, 42.0, 1000.0, 9999.0] {
                let t = Transform {
                    scale,
                    translate_x: drag,
                    translate_y: -drag,
                };
                let settled = settle(t, viewport);
                let s = settled.scale;
                if s * viewport.0 > viewport.0 {
                    let bound = (s * viewport.0 - viewport.0) / 2.0 / s;
                    assert!(settled.translate_x.abs() <= bound + EPSILON);
                } else {
                    assert_eq!(settled.translate_x, 0.0);
                }
                if s * viewport.1 > viewport.1 {
                    let bound = (s * viewport.1 - viewport.1) / 2.0 / s;
                    assert!(settled.translate_y.abs() <= bound + EPSILON);
                } else {
                    assert_eq!(settled.translate_y, 0.0);
                }
            }
        }
    }

    #[test]
    fn settle_pulls_scale_back_to_one() {
        let t = Transform {
            scale: 0.6,
            translate_x: 30.0,
            translate_y: -70.0,
        };
        let settled = settle(t, (400.0, 800.0));
        assert_eq!(settled.scale, 1.0);
        assert_eq!(settled.translate_x, 0.0);
        assert_eq!(settled.translate_y, 0.0);
    }

    #[test]
    fn pinch_scale_stays_in_bounds() {
        let mut t = Transform::identity();
        for &diff in &[10_000.0, 500.0, -100_000.0, 3.0, f32::MAX / 2.0] {
            t = resolve_pinch(t, diff, (0.0, 0.0));
            assert!(t.scale >= MIN_SCALE && t.scale <= MAX_SCALE);
        }
    }

    #[test]
    fn pinch_delta_of_40_from_identity_gives_1_2() {
        // 40 / 200 sensitivity = +0.2
        let t = resolve_pinch(Transform::identity(), 40.0, (0.0, 0.0));
        assert!(approx_eq(t.scale, 1.2));
    }

    #[test]
    fn zero_distance_pinch_changes_nothing() {
        let t = Transform {
            scale: 1.7,
            translate_x: 12.0,
            translate_y: -9.0,
        };
        let out = resolve_pinch(t, 0.0, (55.0, -30.0));
        assert_eq!(out, t);
        assert!(!out.translate_x.is_nan());
        assert!(!out.translate_y.is_nan());
    }

    #[test]
    fn pinch_preserves_focal_point() {
        // Image point under the focal screen point must not move.
        let t = Transform {
            scale: 1.5,
            translate_x: 20.0,
            translate_y: -10.0,
        };
        let focal = (80.0, -40.0);
        let before_x = focal.0 / t.scale - t.translate_x;
        let before_y = focal.1 / t.scale - t.translate_y;

        let out = resolve_pinch(t, 120.0, focal);
        let after_x = focal.0 / out.scale - out.translate_x;
        let after_y = focal.1 / out.scale - out.translate_y;

        assert!(approx_eq(before_x, after_x));
        assert!(approx_eq(before_y, after_y));
    }

    #[test]
    fn double_tap_toggles_between_one_and_two() {
        let viewport = (400.0, 800.0);
        let tap = (60.0, -120.0);
        let zoomed = double_tap_target(Transform::identity(), tap, viewport);
        assert_eq!(zoomed.scale, DOUBLE_TAP_SCALE);
        let back = double_tap_target(zoomed, tap, viewport);
        assert_eq!(back, Transform::identity());
    }

    #[test]
    fn double_tap_centres_on_tap_point_within_bounds() {
        let viewport = (400.0, 800.0);
        let t = double_tap_target(Transform::identity(), (100.0, 0.0), viewport);
        // translate = 100 * (1/2 - 1) = -50, inside the 100px bound
        assert!(approx_eq(t.translate_x, -50.0));
        assert!(t.translate_x.abs() <= pan_bound(t.scale, viewport.0) + EPSILON);
    }

    #[test]
    fn pan_within_bounds_moves_freely() {
        let axis = PanAxis::default();
        let out = resolve_pan(axis, 50.0, 2.0, 400.0);
        // 50px screen delta at 2x = 25 image px, bound is 100
        assert!(approx_eq(out.translate, 25.0));
        assert_eq!(out.overflow, 0.0);
    }

    #[test]
    fn pan_past_bound_spills_into_overflow() {
        let axis = PanAxis::default();
        let out = resolve_pan(axis, 500.0, 2.0, 400.0);
        assert!(approx_eq(out.translate, 100.0));
        assert!(out.overflow > 0.0);
        assert!(out.overflow <= OVERFLOW_MAX);
    }

    #[test]
    fn overflow_caps_at_max() {
        let mut axis = PanAxis::default();
        for _ in 0..50 {
            axis = resolve_pan(axis, 300.0, 2.0, 400.0);
        }
        assert!(approx_eq(axis.overflow, OVERFLOW_MAX));
        assert!(approx_eq(axis.translate, 100.0));
    }

    #[test]
    fn reverse_drag_unwinds_overflow_before_moving() {
        let axis = PanAxis {
            translate: 100.0,
            overflow: 60.0,
        };
        let out = resolve_pan(axis, -40.0, 2.0, 400.0);
        assert!(approx_eq(out.translate, 100.0));
        assert!(approx_eq(out.overflow, 20.0));

        let out = resolve_pan(out, -60.0, 2.0, 400.0);
        // 20px unwinds the rest, the remaining 40px moves the image
        assert!(approx_eq(out.overflow, 0.0));
        assert!(approx_eq(out.translate, 100.0 - 40.0 / 2.0));
    }

    #[test]
    fn unzoomed_pan_stays_pinned_horizontally() {
        let out = resolve_pan(PanAxis::default(), 30.0, 1.0, 400.0);
        assert_eq!(out.translate, 0.0);
        assert!(out.overflow > 0.0);
    }

    #[test]
    fn scale_below_minimum_never_divides_by_zero() {
        let bound = pan_bound(0.0, 400.0);
        assert!(!bound.is_nan());
        let axis = resolve_pan(PanAxis::default(), 10.0, 0.0, 400.0);
        assert!(!axis.translate.is_nan());
        assert!(!visible_translate(axis, 0.0).is_nan());
    }
}
