//! [`RenderingContext`] for the raster canvas.
//!
//! Every call forwards to the inherent canvas method of the same meaning,
//! narrowing coordinates to the `f32` tiny-skia works in.

use super::Canvas2dContext;
use canvg_rs::context::{
    FillRule, ImageData, LineCap, LineJoin, Paint, RecordingContext, RenderingContext, TextAlign,
    TextBaseline,
};
use canvg_rs::geometry::Matrix;

impl RenderingContext for Canvas2dContext {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if let Err(err) = Canvas2dContext::resize(self, width, height) {
            log::error!(target: "canvas", "cannot resize canvas: {err}");
        }
    }

    fn save(&mut self) {
        Canvas2dContext::save(self)
    }

    fn restore(&mut self) {
        Canvas2dContext::restore(self)
    }

    fn begin_path(&mut self) {
        Canvas2dContext::begin_path(self)
    }

    fn close_path(&mut self) {
        Canvas2dContext::close_path(self)
    }

    fn move_to(&mut self, x: f64, y: f64) {
        Canvas2dContext::move_to(self, x as f32, y as f32)
    }

    fn line_to(&mut self, x: f64, y: f64) {
        Canvas2dContext::line_to(self, x as f32, y as f32)
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        Canvas2dContext::bezier_curve_to(
            self,
            cp1x as f32,
            cp1y as f32,
            cp2x as f32,
            cp2y as f32,
            x as f32,
            y as f32,
        )
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        Canvas2dContext::quadratic_curve_to(self, cpx as f32, cpy as f32, x as f32, y as f32)
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        Canvas2dContext::arc(
            self,
            x as f32,
            y as f32,
            radius as f32,
            start as f32,
            end as f32,
            anticlockwise,
        )
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        Canvas2dContext::rect(self, x as f32, y as f32, width as f32, height as f32)
    }

    fn fill(&mut self, rule: FillRule) {
        self.fill_with_rule(rule)
    }

    fn stroke(&mut self) {
        Canvas2dContext::stroke(self)
    }

    fn clip(&mut self, rule: FillRule) {
        self.clip_with_rule(rule)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        Canvas2dContext::fill_rect(self, x as f32, y as f32, width as f32, height as f32)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        Canvas2dContext::clear_rect(self, x as f32, y as f32, width as f32, height as f32)
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        Canvas2dContext::is_point_in_path(self, x as f32, y as f32)
    }

    fn translate(&mut self, x: f64, y: f64) {
        Canvas2dContext::translate(self, x as f32, y as f32)
    }

    fn rotate(&mut self, angle: f64) {
        Canvas2dContext::rotate(self, angle as f32)
    }

    fn scale(&mut self, x: f64, y: f64) {
        Canvas2dContext::scale(self, x as f32, y as f32)
    }

    fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        Canvas2dContext::transform(self, &Matrix::new(a, b, c, d, e, f))
    }

    fn set_transform(&mut self, matrix: Matrix) {
        Canvas2dContext::set_transform(self, &matrix)
    }

    fn get_transform(&self) -> Matrix {
        Canvas2dContext::get_transform(self)
    }

    fn fill_style(&self) -> Paint {
        self.state.fill_style.clone()
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.set_fill_paint(paint)
    }

    fn stroke_style(&self) -> Paint {
        self.state.stroke_style.clone()
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.set_stroke_paint(paint)
    }

    fn line_width(&self) -> f64 {
        self.state.line_width as f64
    }

    fn set_line_width(&mut self, width: f64) {
        Canvas2dContext::set_line_width(self, width as f32)
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        Canvas2dContext::set_line_cap(self, cap)
    }

    fn set_line_join(&mut self, join: LineJoin) {
        Canvas2dContext::set_line_join(self, join)
    }

    fn set_miter_limit(&mut self, limit: f64) {
        Canvas2dContext::set_miter_limit(self, limit as f32)
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        Canvas2dContext::set_line_dash(self, segments.iter().map(|&s| s as f32).collect())
    }

    fn set_line_dash_offset(&mut self, offset: f64) {
        Canvas2dContext::set_line_dash_offset(self, offset as f32)
    }

    fn global_alpha(&self) -> f64 {
        self.state.global_alpha as f64
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        Canvas2dContext::set_global_alpha(self, alpha as f32)
    }

    fn set_global_composite_operation(&mut self, operation: &str) -> bool {
        Canvas2dContext::set_global_composite_operation(self, operation)
    }

    fn font(&self) -> String {
        Canvas2dContext::font(self).to_string()
    }

    fn set_font(&mut self, font: &str) {
        if let Err(err) = Canvas2dContext::set_font(self, font) {
            log::debug!(target: "canvas", "ignoring font: {err}");
        }
    }

    fn set_text_align(&mut self, align: TextAlign) {
        Canvas2dContext::set_text_align(self, align)
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        Canvas2dContext::set_text_baseline(self, baseline)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        Canvas2dContext::fill_text(self, text, x as f32, y as f32)
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        Canvas2dContext::stroke_text(self, text, x as f32, y as f32)
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        Canvas2dContext::measure_text(self, text).width as f64
    }

    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64) {
        Canvas2dContext::draw_image(self, image, dx as f32, dy as f32, dw as f32, dh as f32)
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData {
        Canvas2dContext::get_image_data(self, x, y, width, height)
    }

    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        Canvas2dContext::put_image_data(self, image, dx, dy)
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn RenderingContext> {
        match self.create_offscreen_canvas(width.max(1), height.max(1)) {
            Ok(canvas) => Box::new(canvas),
            Err(err) => {
                log::error!(target: "canvas", "cannot create offscreen canvas: {err}");
                Box::new(RecordingContext::new(
                    width.clamp(1, super::MAX_DIMENSION),
                    height.clamp(1, super::MAX_DIMENSION),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_canvas;
    use canvg_rs::context::RenderingContext;

    #[test]
    fn test_trait_calls_reach_pixels() {
        let mut canvas = test_canvas(20, 20);
        let ctx: &mut dyn RenderingContext = &mut canvas;
        ctx.translate(5.0, 5.0);
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        ctx.fill(canvg_rs::context::FillRule::NonZero);
        assert!(ctx.is_point_in_path(10.0, 10.0));
        assert_eq!(ctx.get_image_data(10, 10, 1, 1).pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(ctx.get_image_data(2, 2, 1, 1).pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_offscreen_is_a_blank_canvas() {
        let mut canvas = test_canvas(20, 20);
        RenderingContext::fill_rect(&mut canvas, 0.0, 0.0, 20.0, 20.0);
        let offscreen = RenderingContext::create_offscreen(&canvas, 0, 7);
        assert_eq!((offscreen.width(), offscreen.height()), (1, 7));
        assert_eq!(offscreen.get_image_data(0, 0, 1, 1).pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_font_is_ignored() {
        let mut canvas = test_canvas(4, 4);
        let ctx: &mut dyn RenderingContext = &mut canvas;
        ctx.set_font("12px Arial");
        ctx.set_font("nonsense");
        assert_eq!(ctx.font(), "12px Arial");
    }
}
