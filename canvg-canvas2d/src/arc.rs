//! Canvas `arc()` sweeps as cubic bezier segments.
//!
//! tiny-skia has no arc primitive, so arcs go through `kurbo` and come out
//! as cubics in user space.

use kurbo::{Arc, PathEl, Point, Vec2};
use std::f64::consts::TAU;

const TOLERANCE: f64 = 1e-3;

/// Signed sweep the canvas draws from `start` to `end`.
///
/// A full turn or more in the drawing direction is a full circle; anything
/// else wraps into a single turn.
pub(crate) fn sweep_angle(start: f64, end: f64, anticlockwise: bool) -> f64 {
    if anticlockwise {
        let delta = start - end;
        if delta >= TAU {
            -TAU
        } else {
            -delta.rem_euclid(TAU)
        }
    } else {
        let delta = end - start;
        if delta >= TAU {
            TAU
        } else {
            delta.rem_euclid(TAU)
        }
    }
}

/// The start point of the arc followed by its cubic segments.
pub(crate) fn arc_elements(
    cx: f64,
    cy: f64,
    radius: f64,
    start: f64,
    end: f64,
    anticlockwise: bool,
) -> (Point, Vec<PathEl>) {
    let arc = Arc {
        center: Point::new(cx, cy),
        radii: Vec2::new(radius, radius),
        start_angle: start,
        sweep_angle: sweep_angle(start, end, anticlockwise),
        x_rotation: 0.0,
    };
    let start_point = Point::new(cx + radius * start.cos(), cy + radius * start.sin());
    if radius <= 0.0 {
        return (start_point, Vec::new());
    }
    (start_point, arc.append_iter(TOLERANCE).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_sweep_angles() {
        assert_eq!(sweep_angle(0.0, TAU, false), TAU);
        assert_eq!(sweep_angle(0.0, 3.0 * TAU, false), TAU);
        assert!((sweep_angle(0.0, PI / 2.0, false) - PI / 2.0).abs() < 1e-12);
        assert!((sweep_angle(0.0, -PI / 2.0, false) - 1.5 * PI).abs() < 1e-12);
        assert!((sweep_angle(0.0, PI / 2.0, true) + 1.5 * PI).abs() < 1e-12);
        assert_eq!(sweep_angle(TAU, 0.0, true), -TAU);
        assert_eq!(sweep_angle(1.0, 1.0, false), 0.0);
    }

    #[test]
    fn test_full_circle_ends_where_it_starts() {
        let (start, elements) = arc_elements(50.0, 50.0, 10.0, 0.0, TAU, false);
        assert!((start.x - 60.0).abs() < 1e-9 && (start.y - 50.0).abs() < 1e-9);
        assert!(!elements.is_empty());
        let Some(PathEl::CurveTo(_, _, end)) = elements.last() else {
            panic!("expected a cubic segment");
        };
        assert!((end.x - 60.0).abs() < 1e-6 && (end.y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_radius_is_just_a_point() {
        let (start, elements) = arc_elements(5.0, 5.0, 0.0, 0.0, PI, false);
        assert_eq!((start.x, start.y), (5.0, 5.0));
        assert!(elements.is_empty());
    }
}
