//! Path building operations for Canvas2dContext.
//!
//! Points are mapped through the current transform as they are added, so the
//! path builder always holds device-space geometry.

use super::Canvas2dContext;
use kurbo::PathEl;
use tiny_skia::{PathSegment, Transform};

/// Line segments per curve when hit testing.
const FLATTEN_STEPS: usize = 16;

impl Canvas2dContext {
    pub fn begin_path(&mut self) {
        log::trace!(target: "canvas", "beginPath");
        self.path_builder = tiny_skia::PathBuilder::new();
        self.current_point = None;
    }

    pub(crate) fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        map_point(&self.state.transform, x, y)
    }

    fn device_move_to(&mut self, x: f32, y: f32) {
        self.path_builder.move_to(x, y);
        self.current_point = Some((x, y));
        self.subpath_start = (x, y);
    }

    fn device_line_to(&mut self, x: f32, y: f32) {
        if self.current_point.is_none() {
            self.device_move_to(x, y);
            return;
        }
        self.path_builder.line_to(x, y);
        self.current_point = Some((x, y));
    }

    /// Curves with no current point start at their first control point.
    fn ensure_subpath(&mut self, x: f32, y: f32) {
        if self.current_point.is_none() {
            self.device_move_to(x, y);
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        log::trace!(target: "canvas", "moveTo {x} {y}");
        let (tx, ty) = self.transform_point(x, y);
        self.device_move_to(tx, ty);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        log::trace!(target: "canvas", "lineTo {x} {y}");
        let (tx, ty) = self.transform_point(x, y);
        self.device_line_to(tx, ty);
    }

    pub fn close_path(&mut self) {
        log::trace!(target: "canvas", "closePath");
        if self.current_point.is_some() {
            self.path_builder.close();
            self.current_point = Some(self.subpath_start);
        }
    }

    pub fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        let (c1x, c1y) = self.transform_point(cp1x, cp1y);
        let (c2x, c2y) = self.transform_point(cp2x, cp2y);
        let (tx, ty) = self.transform_point(x, y);
        self.ensure_subpath(c1x, c1y);
        self.path_builder.cubic_to(c1x, c1y, c2x, c2y, tx, ty);
        self.current_point = Some((tx, ty));
    }

    pub fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        let (cx, cy) = self.transform_point(cpx, cpy);
        let (tx, ty) = self.transform_point(x, y);
        self.ensure_subpath(cx, cy);
        self.path_builder.quad_to(cx, cy, tx, ty);
        self.current_point = Some((tx, ty));
    }

    /// Adds a closed rectangle subpath; the current point becomes its origin.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        log::trace!(target: "canvas", "rect {x} {y} {width} {height}");
        let corners = [
            self.transform_point(x, y),
            self.transform_point(x + width, y),
            self.transform_point(x + width, y + height),
            self.transform_point(x, y + height),
        ];
        self.device_move_to(corners[0].0, corners[0].1);
        for &(cx, cy) in &corners[1..] {
            self.path_builder.line_to(cx, cy);
        }
        self.path_builder.close();
        self.current_point = Some(corners[0]);
    }

    /// Adds a circular arc, joined to the current point by a straight line.
    pub fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32, anticlockwise: bool) {
        if !radius.is_finite() || radius < 0.0 {
            log::debug!(target: "canvas", "ignoring arc with radius {radius}");
            return;
        }
        let (start_point, elements) = crate::arc::arc_elements(
            x as f64,
            y as f64,
            radius as f64,
            start as f64,
            end as f64,
            anticlockwise,
        );
        let (sx, sy) = self.transform_point(start_point.x as f32, start_point.y as f32);
        self.device_line_to(sx, sy);

        for element in elements {
            if let PathEl::CurveTo(p1, p2, p3) = element {
                let (c1x, c1y) = self.transform_point(p1.x as f32, p1.y as f32);
                let (c2x, c2y) = self.transform_point(p2.x as f32, p2.y as f32);
                let (ex, ey) = self.transform_point(p3.x as f32, p3.y as f32);
                self.path_builder.cubic_to(c1x, c1y, c2x, c2y, ex, ey);
                self.current_point = Some((ex, ey));
            }
        }
    }

    /// Non-zero winding test of a device-space point against the current
    /// path. Open subpaths count as implicitly closed.
    pub fn is_point_in_path(&self, x: f32, y: f32) -> bool {
        let Some(path) = self.path_builder.clone().finish() else {
            return false;
        };
        let mut winding = 0;
        for polygon in flatten(&path) {
            for (i, &(x0, y0)) in polygon.iter().enumerate() {
                let (x1, y1) = polygon[(i + 1) % polygon.len()];
                let side = (x1 - x0) * (y - y0) - (x - x0) * (y1 - y0);
                if y0 <= y {
                    if y1 > y && side > 0.0 {
                        winding += 1;
                    }
                } else if y1 <= y && side < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding != 0
    }
}

pub(crate) fn map_point(transform: &Transform, x: f32, y: f32) -> (f32, f32) {
    (
        transform.sx * x + transform.kx * y + transform.tx,
        transform.ky * x + transform.sy * y + transform.ty,
    )
}

/// Each subpath as a polygon, curves sampled at fixed steps.
fn flatten(path: &tiny_skia::Path) -> Vec<Vec<(f32, f32)>> {
    let mut polygons: Vec<Vec<(f32, f32)>> = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    let mut last = (0.0, 0.0);

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                if current.len() > 1 {
                    polygons.push(std::mem::take(&mut current));
                }
                current.clear();
                last = (p.x, p.y);
                current.push(last);
            }
            PathSegment::LineTo(p) => {
                last = (p.x, p.y);
                current.push(last);
            }
            PathSegment::QuadTo(c, p) => {
                for step in 1..=FLATTEN_STEPS {
                    let t = step as f32 / FLATTEN_STEPS as f32;
                    let mt = 1.0 - t;
                    current.push((
                        mt * mt * last.0 + 2.0 * mt * t * c.x + t * t * p.x,
                        mt * mt * last.1 + 2.0 * mt * t * c.y + t * t * p.y,
                    ));
                }
                last = (p.x, p.y);
            }
            PathSegment::CubicTo(c1, c2, p) => {
                for step in 1..=FLATTEN_STEPS {
                    let t = step as f32 / FLATTEN_STEPS as f32;
                    let mt = 1.0 - t;
                    let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
                    current.push((
                        a * last.0 + b * c1.x + c * c2.x + d * p.x,
                        a * last.1 + b * c1.y + c * c2.y + d * p.y,
                    ));
                }
                last = (p.x, p.y);
            }
            PathSegment::Close => {
                if let Some(&first) = current.first() {
                    last = first;
                }
            }
        }
    }
    if current.len() > 1 {
        polygons.push(current);
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::super::test_canvas;

    #[test]
    fn test_points_are_mapped_to_device_space() {
        let mut ctx = test_canvas(100, 100);
        ctx.translate(10.0, 20.0);
        ctx.scale(2.0, 2.0);
        ctx.begin_path();
        ctx.move_to(5.0, 5.0);
        assert_eq!(ctx.current_point, Some((20.0, 30.0)));
    }

    #[test]
    fn test_line_to_without_current_point_moves() {
        let mut ctx = test_canvas(10, 10);
        ctx.begin_path();
        ctx.line_to(3.0, 4.0);
        assert_eq!(ctx.current_point, Some((3.0, 4.0)));
        assert_eq!(ctx.subpath_start, (3.0, 4.0));
    }

    #[test]
    fn test_close_path_returns_to_subpath_start() {
        let mut ctx = test_canvas(10, 10);
        ctx.begin_path();
        ctx.move_to(1.0, 1.0);
        ctx.line_to(5.0, 1.0);
        ctx.close_path();
        assert_eq!(ctx.current_point, Some((1.0, 1.0)));
    }

    #[test]
    fn test_point_in_rect_and_circle() {
        let mut ctx = test_canvas(100, 100);
        ctx.begin_path();
        ctx.rect(10.0, 10.0, 20.0, 20.0);
        assert!(ctx.is_point_in_path(15.0, 15.0));
        assert!(!ctx.is_point_in_path(35.0, 15.0));

        ctx.begin_path();
        ctx.arc(50.0, 50.0, 10.0, 0.0, std::f32::consts::TAU, false);
        assert!(ctx.is_point_in_path(50.0, 50.0));
        assert!(ctx.is_point_in_path(58.0, 50.0));
        assert!(!ctx.is_point_in_path(58.0, 58.0));
    }

    #[test]
    fn test_point_in_path_uses_device_space() {
        let mut ctx = test_canvas(100, 100);
        ctx.scale(10.0, 10.0);
        ctx.begin_path();
        ctx.rect(1.0, 1.0, 2.0, 2.0);
        assert!(ctx.is_point_in_path(20.0, 20.0));
        assert!(!ctx.is_point_in_path(2.0, 2.0));
    }

    #[test]
    fn test_empty_path_contains_nothing() {
        let ctx = test_canvas(10, 10);
        assert!(!ctx.is_point_in_path(1.0, 1.0));
    }
}
