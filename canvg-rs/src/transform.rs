//! SVG `transform` lists applied to and removed from a drawing surface.

use crate::context::RenderingContext;
use crate::element::ElementRef;
use crate::geometry::{Matrix, Point, PSEUDO_ZERO};
use crate::property::Axis;
use crate::util::{compress_spaces, to_numbers};
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::Cell;

lazy_static! {
    static ref FUNCTION_BOUNDARY_RE: Regex = Regex::new(r"\)\s*,?\s*").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Translate(Point),
    /// Angle in radians about `(cx, cy)`.
    Rotate { angle: f64, cx: f64, cy: f64 },
    Scale(Point),
    Matrix(Matrix),
}

/// A parsed transform list. `transform-origin` shifts rotations, scales and
/// matrices but not translations.
#[derive(Debug, Clone, Default)]
pub struct Transform {
    steps: Vec<Step>,
    origin: Point,
    /// Surface matrix from before the last `apply`, kept only when a step
    /// cannot be inverted.
    saved: Cell<Option<Matrix>>,
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps && self.origin == other.origin
    }
}

impl Transform {
    pub fn parse(value: &str) -> Transform {
        Self::parse_with_origin(value, Point::default())
    }

    pub fn parse_with_origin(value: &str, origin: Point) -> Transform {
        let normalized = compress_spaces(value);
        let steps = FUNCTION_BOUNDARY_RE
            .split(normalized.trim())
            .filter_map(|function| {
                let (name, args) = function.split_once('(')?;
                parse_step(name.trim(), args.trim())
            })
            .collect();
        Transform {
            steps,
            origin,
            saved: Cell::new(None),
        }
    }

    /// Reads the element's own `transform` and `transform-origin` styles.
    pub fn from_element(element: ElementRef<'_>) -> Option<Transform> {
        let transform = element.get_own_style("transform");
        if !transform.has_value() {
            return None;
        }
        let origin_parts = element.get_own_style("transform-origin").split();
        let origin = match origin_parts.as_slice() {
            [] => Point::default(),
            [both] => Point::new(both.get_pixels(Axis::X), both.get_pixels(Axis::Y)),
            [x, y, ..] => Point::new(x.get_pixels(Axis::X), y.get_pixels(Axis::Y)),
        };
        Some(Self::parse_with_origin(&transform.get_string(), origin))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, ctx: &mut dyn RenderingContext) {
        if self.is_singular() {
            self.saved.set(Some(ctx.get_transform()));
        }
        for step in &self.steps {
            self.apply_step(ctx, step, false);
        }
    }

    /// Undoes [`Transform::apply`], last step first. A list holding a
    /// singular matrix puts back the surface matrix seen by `apply`.
    pub fn unapply(&self, ctx: &mut dyn RenderingContext) {
        if let Some(saved) = self.saved.take() {
            ctx.set_transform(saved);
            return;
        }
        for step in self.steps.iter().rev() {
            self.apply_step(ctx, step, true);
        }
    }

    fn is_singular(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step, Step::Matrix(matrix) if matrix.invert().is_none()))
    }

    /// The list collapsed into one matrix.
    pub fn to_matrix(&self) -> Matrix {
        self.steps
            .iter()
            .fold(Matrix::identity(), |acc, step| acc.multiply(&self.step_matrix(step)))
    }

    pub fn apply_to_point(&self, point: Point) -> Point {
        self.to_matrix().apply_to_point(point)
    }

    fn step_matrix(&self, step: &Step) -> Matrix {
        let Point { x: ox, y: oy } = self.origin;
        let around = |tx: f64, ty: f64, inner: Matrix| {
            Matrix::translation(tx, ty)
                .multiply(&inner)
                .multiply(&Matrix::translation(-tx, -ty))
        };
        match *step {
            Step::Translate(offset) => Matrix::translation(offset.x, offset.y),
            Step::Rotate { angle, cx, cy } => around(cx + ox, cy + oy, Matrix::rotation(angle)),
            Step::Scale(scale) => around(ox, oy, Matrix::scaling(scale.x, scale.y)),
            Step::Matrix(matrix) => around(ox, oy, matrix),
        }
    }

    fn apply_step(&self, ctx: &mut dyn RenderingContext, step: &Step, inverse: bool) {
        let Point { x: ox, y: oy } = self.origin;
        match *step {
            Step::Translate(offset) => {
                if inverse {
                    ctx.translate(-offset.x, -offset.y);
                } else {
                    ctx.translate(offset.x, offset.y);
                }
            }
            Step::Rotate { angle, cx, cy } => {
                let (tx, ty) = (cx + ox, cy + oy);
                ctx.translate(tx, ty);
                ctx.rotate(if inverse { -angle } else { angle });
                ctx.translate(-tx, -ty);
            }
            Step::Scale(scale) => {
                ctx.translate(ox, oy);
                if inverse {
                    ctx.scale(1.0 / scale.x, 1.0 / scale.y);
                } else {
                    ctx.scale(scale.x, scale.y);
                }
                ctx.translate(-ox, -oy);
            }
            Step::Matrix(matrix) => {
                let matrix = if inverse {
                    match matrix.invert() {
                        Some(inverted) => inverted,
                        None => {
                            log::debug!(target: "canvg::render", "singular transform matrix");
                            return;
                        }
                    }
                } else {
                    matrix
                };
                ctx.translate(ox, oy);
                ctx.transform(matrix.a, matrix.b, matrix.c, matrix.d, matrix.e, matrix.f);
                ctx.translate(-ox, -oy);
            }
        }
    }
}

fn parse_step(name: &str, args: &str) -> Option<Step> {
    let args = args.trim_end_matches(')');
    let numbers = to_numbers(args);
    let arg = |i: usize| numbers.get(i).copied().unwrap_or(0.0);
    match name {
        "translate" => Some(Step::Translate(Point::parse(args))),
        "rotate" => Some(Step::Rotate {
            angle: arg(0).to_radians(),
            cx: arg(1),
            cy: arg(2),
        }),
        "scale" => {
            let mut scale = Point::parse_scale(args);
            if scale.x == 0.0 {
                scale.x = PSEUDO_ZERO;
            }
            if scale.y == 0.0 {
                scale.y = PSEUDO_ZERO;
            }
            Some(Step::Scale(scale))
        }
        "matrix" => Some(Step::Matrix(Matrix::new(
            arg(0),
            arg(1),
            arg(2),
            arg(3),
            arg(4),
            arg(5),
        ))),
        "skewX" => Some(Step::Matrix(Matrix::new(
            1.0,
            0.0,
            arg(0).to_radians().tan(),
            1.0,
            0.0,
            0.0,
        ))),
        "skewY" => Some(Step::Matrix(Matrix::new(
            1.0,
            arg(0).to_radians().tan(),
            0.0,
            1.0,
            0.0,
            0.0,
        ))),
        "none" | "" => None,
        other => {
            log::debug!(target: "canvg::parser", "ignoring unknown transform function {other}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingContext;
    use rstest::rstest;

    #[rstest]
    #[case("translate(10, 20) rotate(30) scale(2, 0.5)")]
    #[case("matrix(1 2 3 4 5 6)")]
    #[case("skewX(20) skewY(-10) translate(3)")]
    #[case("rotate(45 10 10)")]
    fn test_apply_then_unapply_restores_identity(#[case] value: &str) {
        let mut ctx = RecordingContext::new(10, 10);
        let transform = Transform::parse(value);
        transform.apply(&mut ctx);
        transform.unapply(&mut ctx);
        assert!(ctx.get_transform().approx_eq(&Matrix::identity(), 1e-9));
    }

    #[test]
    fn test_apply_matches_to_matrix() {
        let mut ctx = RecordingContext::new(10, 10);
        let transform = Transform::parse("translate(5,6)scale(2)rotate(90)");
        transform.apply(&mut ctx);
        assert!(ctx.get_transform().approx_eq(&transform.to_matrix(), 1e-9));
    }

    #[test]
    fn test_apply_to_point_composes_right_to_left() {
        let transform = Transform::parse("translate(10) scale(2)");
        let point = transform.apply_to_point(Point::new(1.0, 1.0));
        assert!((point.x - 12.0).abs() < 1e-12);
        assert!((point.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_stays_invertible() {
        let mut ctx = RecordingContext::new(10, 10);
        let transform = Transform::parse("scale(0)");
        transform.apply(&mut ctx);
        transform.unapply(&mut ctx);
        assert!(ctx.get_transform().approx_eq(&Matrix::identity(), 1e-6));
    }

    #[test]
    fn test_origin_shifts_rotation() {
        let transform = Transform::parse_with_origin("rotate(180)", Point::new(5.0, 5.0));
        let point = transform.apply_to_point(Point::new(0.0, 0.0));
        assert!((point.x - 10.0).abs() < 1e-9);
        assert!((point.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_functions_are_skipped() {
        assert!(Transform::parse("none").is_empty());
        assert!(Transform::parse("wobble(3)").is_empty());
    }

    #[test]
    fn test_singular_matrix_restores_surface_matrix() {
        let start = Matrix::new(2.0, 0.0, 0.0, 2.0, 5.0, 5.0);
        let mut ctx = RecordingContext::new(10, 10);
        ctx.set_transform(start);
        let transform = Transform::parse("translate(3) matrix(1 2 2 4 0 0)");
        transform.apply(&mut ctx);
        transform.unapply(&mut ctx);
        assert_eq!(ctx.get_transform(), start);
        // The saved matrix is used once.
        transform.apply(&mut ctx);
        transform.unapply(&mut ctx);
        assert_eq!(ctx.get_transform(), start);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn invertible_matrix() -> impl Strategy<Value = String> {
            (
                prop::array::uniform4(-2.0..2.0f64),
                -50.0..50.0f64,
                -50.0..50.0f64,
            )
                .prop_filter("matrix must be invertible", |([a, b, c, d], _, _)| {
                    (a * d - b * c).abs() > 1.0
                })
                .prop_map(|([a, b, c, d], e, f)| format!("matrix({a} {b} {c} {d} {e} {f})"))
        }

        fn step() -> impl Strategy<Value = String> {
            prop_oneof![
                (-100.0..100.0f64, -100.0..100.0f64).prop_map(|(x, y)| format!("translate({x}, {y})")),
                (-360.0..360.0f64).prop_map(|angle| format!("rotate({angle})")),
                (-360.0..360.0f64, -50.0..50.0f64, -50.0..50.0f64)
                    .prop_map(|(angle, cx, cy)| format!("rotate({angle} {cx} {cy})")),
                (0.5..2.0f64, 0.5..2.0f64, any::<bool>()).prop_map(|(x, y, flip)| {
                    format!("scale({}, {y})", if flip { -x } else { x })
                }),
                (-60.0..60.0f64).prop_map(|angle| format!("skewX({angle})")),
                (-60.0..60.0f64).prop_map(|angle| format!("skewY({angle})")),
                invertible_matrix(),
            ]
        }

        fn chain() -> impl Strategy<Value = String> {
            prop::collection::vec(step(), 1..5).prop_map(|steps| steps.join(" "))
        }

        proptest! {
            #[test]
            fn test_random_chains_unapply_to_identity(value in chain()) {
                let mut ctx = RecordingContext::new(10, 10);
                let transform = Transform::parse(&value);
                prop_assert!(!transform.is_empty());
                transform.apply(&mut ctx);
                transform.unapply(&mut ctx);
                let left = ctx.get_transform();
                prop_assert!(left.approx_eq(&Matrix::identity(), 1e-6), "{} left {:?}", value, left);
            }

            #[test]
            fn test_singular_step_in_random_chain_restores_start(
                prefix in chain(),
                suffix in chain(),
                scale in 0.5..4.0f64,
            ) {
                let start = Matrix::new(scale, 0.0, 0.0, scale, 7.0, -3.0);
                let mut ctx = RecordingContext::new(10, 10);
                ctx.set_transform(start);
                let transform = Transform::parse(&format!("{prefix} matrix(1 2 2 4 0 0) {suffix}"));
                transform.apply(&mut ctx);
                transform.unapply(&mut ctx);
                prop_assert_eq!(ctx.get_transform(), start);
            }
        }
    }
}
