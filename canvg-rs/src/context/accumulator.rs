use super::{
    FillRule, ImageData, LineCap, LineJoin, Paint, RenderingContext, TextAlign, TextBaseline,
};
use crate::geometry::Matrix;

/// Wraps a surface so several elements can contribute to one path.
///
/// While `accumulating` is set, `begin_path` and `close_path` are swallowed,
/// so each child's geometry joins the same composite path instead of
/// restarting it. Everything else passes straight through.
pub struct PathAccumulator<'a> {
    inner: &'a mut dyn RenderingContext,
    accumulating: bool,
}

impl<'a> PathAccumulator<'a> {
    pub fn new(inner: &'a mut dyn RenderingContext) -> Self {
        Self {
            inner,
            accumulating: true,
        }
    }

    pub fn set_accumulating(&mut self, accumulating: bool) {
        self.accumulating = accumulating;
    }

    pub fn is_accumulating(&self) -> bool {
        self.accumulating
    }
}

impl RenderingContext for PathAccumulator<'_> {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.inner.set_size(width, height)
    }

    fn save(&mut self) {
        self.inner.save()
    }

    fn restore(&mut self) {
        self.inner.restore()
    }

    fn begin_path(&mut self) {
        if !self.accumulating {
            self.inner.begin_path()
        }
    }

    fn close_path(&mut self) {
        if !self.accumulating {
            self.inner.close_path()
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.inner.move_to(x, y)
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.inner.line_to(x, y)
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.inner.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y)
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.inner.quadratic_curve_to(cpx, cpy, x, y)
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.inner.arc(x, y, radius, start, end, anticlockwise)
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.rect(x, y, width, height)
    }

    fn fill(&mut self, rule: FillRule) {
        self.inner.fill(rule)
    }

    fn stroke(&mut self) {
        self.inner.stroke()
    }

    fn clip(&mut self, rule: FillRule) {
        self.inner.clip(rule)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.fill_rect(x, y, width, height)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.clear_rect(x, y, width, height)
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        self.inner.is_point_in_path(x, y)
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.inner.translate(x, y)
    }

    fn rotate(&mut self, angle: f64) {
        self.inner.rotate(angle)
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.inner.scale(x, y)
    }

    fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.inner.transform(a, b, c, d, e, f)
    }

    fn set_transform(&mut self, matrix: Matrix) {
        self.inner.set_transform(matrix)
    }

    fn get_transform(&self) -> Matrix {
        self.inner.get_transform()
    }

    fn fill_style(&self) -> Paint {
        self.inner.fill_style()
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.inner.set_fill_style(paint)
    }

    fn stroke_style(&self) -> Paint {
        self.inner.stroke_style()
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.inner.set_stroke_style(paint)
    }

    fn line_width(&self) -> f64 {
        self.inner.line_width()
    }

    fn set_line_width(&mut self, width: f64) {
        self.inner.set_line_width(width)
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.inner.set_line_cap(cap)
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.inner.set_line_join(join)
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.inner.set_miter_limit(limit)
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.inner.set_line_dash(segments)
    }

    fn set_line_dash_offset(&mut self, offset: f64) {
        self.inner.set_line_dash_offset(offset)
    }

    fn global_alpha(&self) -> f64 {
        self.inner.global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.inner.set_global_alpha(alpha)
    }

    fn set_global_composite_operation(&mut self, operation: &str) -> bool {
        self.inner.set_global_composite_operation(operation)
    }

    fn font(&self) -> String {
        self.inner.font()
    }

    fn set_font(&mut self, font: &str) {
        self.inner.set_font(font)
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.inner.set_text_align(align)
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.inner.set_text_baseline(baseline)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.inner.fill_text(text, x, y)
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.inner.stroke_text(text, x, y)
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.inner.measure_text(text)
    }

    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64) {
        self.inner.draw_image(image, dx, dy, dw, dh)
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData {
        self.inner.get_image_data(x, y, width, height)
    }

    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        self.inner.put_image_data(image, dx, dy)
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn RenderingContext> {
        self.inner.create_offscreen(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCall, RecordingContext};

    #[test]
    fn test_swallows_path_boundaries_while_accumulating() {
        let mut inner = RecordingContext::new(10, 10);
        {
            let mut acc = PathAccumulator::new(&mut inner);
            acc.begin_path();
            acc.move_to(1.0, 1.0);
            acc.close_path();
            acc.set_accumulating(false);
            acc.close_path();
        }
        assert_eq!(
            inner.calls(),
            &[DrawCall::MoveTo(1.0, 1.0), DrawCall::ClosePath]
        );
    }
}
