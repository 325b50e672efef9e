//! Transform operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::style::{to_matrix, to_transform};
use canvg_rs::geometry::Matrix;
use tiny_skia::Transform;

impl Canvas2dContext {
    pub fn translate(&mut self, x: f32, y: f32) {
        log::trace!(target: "canvas", "translate {x} {y}");
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    /// Rotate clockwise by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        log::trace!(target: "canvas", "rotate {angle}");
        let (sin, cos) = angle.sin_cos();
        let rotation = Transform::from_row(cos, sin, -sin, cos, 0.0, 0.0);
        self.state.transform = self.state.transform.pre_concat(rotation);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        log::trace!(target: "canvas", "scale {x} {y}");
        self.state.transform = self.state.transform.pre_scale(x, y);
    }

    /// Multiplies `matrix` onto the current transform.
    pub fn transform(&mut self, matrix: &Matrix) {
        log::trace!(target: "canvas", "transform {matrix:?}");
        self.state.transform = self.state.transform.pre_concat(to_transform(matrix));
    }

    /// Replaces the current transform.
    pub fn set_transform(&mut self, matrix: &Matrix) {
        log::trace!(target: "canvas", "setTransform {matrix:?}");
        self.state.transform = to_transform(matrix);
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::identity();
    }

    pub fn get_transform(&self) -> Matrix {
        to_matrix(&self.state.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_canvas;
    use canvg_rs::geometry::Matrix;

    #[test]
    fn test_save_restore_transform() {
        let mut ctx = test_canvas(100, 100);
        ctx.translate(10.0, 20.0);
        ctx.save();
        ctx.translate(30.0, 40.0);
        let t = ctx.get_transform();
        assert_eq!((t.e, t.f), (40.0, 60.0));
        ctx.restore();
        let t = ctx.get_transform();
        assert_eq!((t.e, t.f), (10.0, 20.0));
    }

    #[test]
    fn test_transform_applies_after_current() {
        let mut ctx = test_canvas(10, 10);
        ctx.scale(2.0, 2.0);
        ctx.transform(&Matrix::translation(5.0, 0.0));
        assert!(ctx
            .get_transform()
            .approx_eq(&Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 0.0), 1e-6));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut ctx = test_canvas(10, 10);
        ctx.rotate(std::f32::consts::FRAC_PI_2);
        let (x, y) = ctx.transform_point(1.0, 0.0);
        assert!(x.abs() < 1e-6 && (y - 1.0).abs() < 1e-6);
    }
}
