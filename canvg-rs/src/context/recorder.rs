use super::{
    FillRule, ImageData, LineCap, LineJoin, Paint, RenderingContext, TextAlign, TextBaseline,
};
use crate::font::Font;
use crate::geometry::{Matrix, Point};

/// One recorded drawing operation. Coordinates are as passed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Save,
    Restore,
    BeginPath,
    ClosePath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    QuadraticCurveTo(f64, f64, f64, f64),
    Arc(f64, f64, f64, f64, f64, bool),
    Rect(f64, f64, f64, f64),
    Fill(FillRule, Paint),
    Stroke(Paint, f64),
    Clip(FillRule),
    FillRect(f64, f64, f64, f64, Paint),
    ClearRect(f64, f64, f64, f64),
    FillText(String, f64, f64, Paint),
    StrokeText(String, f64, f64),
    DrawImage(u32, u32, f64, f64, f64, f64),
    PutImageData(u32, u32, i32, i32),
    SetFont(String),
    SetTransform(Matrix),
    Transform(Matrix),
}

#[derive(Debug, Clone)]
struct RecorderState {
    transform: Matrix,
    fill: Paint,
    stroke: Paint,
    line_width: f64,
    alpha: f64,
    font: String,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            transform: Matrix::identity(),
            fill: Paint::default(),
            stroke: Paint::default(),
            line_width: 1.0,
            alpha: 1.0,
            font: "10px sans-serif".to_string(),
        }
    }
}

/// A surface that records calls instead of drawing.
///
/// Tracks the transform stack exactly, flattens the current path in device
/// space for hit testing, and estimates text widths from the font size.
pub struct RecordingContext {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
    state: RecorderState,
    stack: Vec<RecorderState>,
    subpaths: Vec<Vec<Point>>,
    pixels: ImageData,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            state: RecorderState::default(),
            stack: Vec::new(),
            subpaths: Vec::new(),
            pixels: ImageData::new(width, height),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Calls that put ink on the surface (fills, strokes, text, images).
    pub fn paint_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|call| {
            matches!(
                call,
                DrawCall::Fill(..)
                    | DrawCall::Stroke(..)
                    | DrawCall::FillRect(..)
                    | DrawCall::FillText(..)
                    | DrawCall::StrokeText(..)
                    | DrawCall::DrawImage(..)
            )
        })
    }

    fn device(&self, x: f64, y: f64) -> Point {
        self.state.transform.apply_to_point(Point::new(x, y))
    }

    fn last_point(&self) -> Option<Point> {
        self.subpaths.last().and_then(|sub| sub.last()).copied()
    }

    fn push_point(&mut self, x: f64, y: f64) {
        let point = self.device(x, y);
        match self.subpaths.last_mut() {
            Some(sub) => sub.push(point),
            None => self.subpaths.push(vec![point]),
        }
    }

    fn font_size(&self) -> f64 {
        let font = Font::parse(&self.state.font, None);
        crate::util::parse_leading_float(&font.font_size)
    }
}

impl RenderingContext for RecordingContext {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.state = RecorderState::default();
        self.stack.clear();
        self.subpaths.clear();
        self.pixels = ImageData::new(width, height);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.calls.push(DrawCall::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.calls.push(DrawCall::Restore);
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
        self.calls.push(DrawCall::BeginPath);
    }

    fn close_path(&mut self) {
        if let Some(first) = self.subpaths.last().and_then(|sub| sub.first()).copied() {
            self.subpaths.push(vec![first]);
        }
        self.calls.push(DrawCall::ClosePath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let point = self.device(x, y);
        self.subpaths.push(vec![point]);
        self.calls.push(DrawCall::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push_point(x, y);
        self.calls.push(DrawCall::LineTo(x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        let inverse = self.state.transform.invert().unwrap_or_default();
        let start = self
            .last_point()
            .map(|p| inverse.apply_to_point(p))
            .unwrap_or(Point::new(cp1x, cp1y));
        for i in 1..=16 {
            let t = i as f64 / 16.0;
            let px = crate::geometry::sum_cubic(t, start.x, cp1x, cp2x, x);
            let py = crate::geometry::sum_cubic(t, start.y, cp1y, cp2y, y);
            self.push_point(px, py);
        }
        self.calls
            .push(DrawCall::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        let inverse = self.state.transform.invert().unwrap_or_default();
        let start = self
            .last_point()
            .map(|p| inverse.apply_to_point(p))
            .unwrap_or(Point::new(cpx, cpy));
        for i in 1..=16 {
            let t = i as f64 / 16.0;
            let mt = 1.0 - t;
            let px = mt * mt * start.x + 2.0 * mt * t * cpx + t * t * x;
            let py = mt * mt * start.y + 2.0 * mt * t * cpy + t * t * y;
            self.push_point(px, py);
        }
        self.calls.push(DrawCall::QuadraticCurveTo(cpx, cpy, x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        let mut sweep = end - start;
        if anticlockwise && sweep > 0.0 {
            sweep -= std::f64::consts::TAU;
        } else if !anticlockwise && sweep < 0.0 {
            sweep += std::f64::consts::TAU;
        }
        for i in 0..=32 {
            let angle = start + sweep * i as f64 / 32.0;
            self.push_point(x + radius * angle.cos(), y + radius * angle.sin());
        }
        self.calls
            .push(DrawCall::Arc(x, y, radius, start, end, anticlockwise));
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let corners = [
            self.device(x, y),
            self.device(x + width, y),
            self.device(x + width, y + height),
            self.device(x, y + height),
            self.device(x, y),
        ];
        self.subpaths.push(corners.to_vec());
        self.calls.push(DrawCall::Rect(x, y, width, height));
    }

    fn fill(&mut self, rule: FillRule) {
        self.calls.push(DrawCall::Fill(rule, self.state.fill.clone()));
    }

    fn stroke(&mut self) {
        self.calls
            .push(DrawCall::Stroke(self.state.stroke.clone(), self.state.line_width));
    }

    fn clip(&mut self, rule: FillRule) {
        self.calls.push(DrawCall::Clip(rule));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls
            .push(DrawCall::FillRect(x, y, width, height, self.state.fill.clone()));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(DrawCall::ClearRect(x, y, width, height));
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        // Non-zero winding over the flattened subpaths.
        let mut winding = 0i32;
        for sub in &self.subpaths {
            if sub.len() < 2 {
                continue;
            }
            let closing = [sub[sub.len() - 1], sub[0]];
            for edge in sub.windows(2).chain(std::iter::once(&closing[..])) {
                let (a, b) = (edge[0], edge[1]);
                if a.y <= y {
                    if b.y > y && (b.x - a.x) * (y - a.y) - (x - a.x) * (b.y - a.y) > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= y && (b.x - a.x) * (y - a.y) - (x - a.x) * (b.y - a.y) < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding != 0
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.multiply(&Matrix::translation(x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.state.transform = self.state.transform.multiply(&Matrix::rotation(angle));
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.multiply(&Matrix::scaling(x, y));
    }

    fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let matrix = Matrix::new(a, b, c, d, e, f);
        self.state.transform = self.state.transform.multiply(&matrix);
        self.calls.push(DrawCall::Transform(matrix));
    }

    fn set_transform(&mut self, matrix: Matrix) {
        self.state.transform = matrix;
        self.calls.push(DrawCall::SetTransform(matrix));
    }

    fn get_transform(&self) -> Matrix {
        self.state.transform
    }

    fn fill_style(&self) -> Paint {
        self.state.fill.clone()
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn stroke_style(&self) -> Paint {
        self.state.stroke.clone()
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.state.stroke = paint;
    }

    fn line_width(&self) -> f64 {
        self.state.line_width
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_line_cap(&mut self, _cap: LineCap) {}

    fn set_line_join(&mut self, _join: LineJoin) {}

    fn set_miter_limit(&mut self, _limit: f64) {}

    fn set_line_dash(&mut self, _segments: &[f64]) {}

    fn set_line_dash_offset(&mut self, _offset: f64) {}

    fn global_alpha(&self) -> f64 {
        self.state.alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.alpha = alpha;
        }
    }

    fn set_global_composite_operation(&mut self, _operation: &str) -> bool {
        true
    }

    fn font(&self) -> String {
        self.state.font.clone()
    }

    fn set_font(&mut self, font: &str) {
        self.state.font = font.to_string();
        self.calls.push(DrawCall::SetFont(font.to_string()));
    }

    fn set_text_align(&mut self, _align: TextAlign) {}

    fn set_text_baseline(&mut self, _baseline: TextBaseline) {}

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.calls
            .push(DrawCall::FillText(text.to_string(), x, y, self.state.fill.clone()));
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.calls.push(DrawCall::StrokeText(text.to_string(), x, y));
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        let size = self.font_size();
        let size = if size.is_finite() { size } else { 10.0 };
        text.chars().count() as f64 * size * 0.5
    }

    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64) {
        self.calls
            .push(DrawCall::DrawImage(image.width, image.height, dx, dy, dw, dh));
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData {
        let mut out = ImageData::new(width, height);
        for row in 0..height {
            for col in 0..width {
                let sx = x + col as i32;
                let sy = y + row as i32;
                if sx < 0 || sy < 0 {
                    continue;
                }
                let px = self.pixels.pixel(sx as u32, sy as u32);
                let idx = (row as usize * width as usize + col as usize) * 4;
                out.data[idx..idx + 4].copy_from_slice(&px);
            }
        }
        out
    }

    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        for row in 0..image.height {
            for col in 0..image.width {
                let tx = dx + col as i32;
                let ty = dy + row as i32;
                if tx < 0 || ty < 0 || tx as u32 >= self.width || ty as u32 >= self.height {
                    continue;
                }
                let src = (row as usize * image.width as usize + col as usize) * 4;
                let dst = (ty as usize * self.width as usize + tx as usize) * 4;
                self.pixels.data[dst..dst + 4].copy_from_slice(&image.data[src..src + 4]);
            }
        }
        self.calls
            .push(DrawCall::PutImageData(image.width, image.height, dx, dy));
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn RenderingContext> {
        Box::new(RecordingContext::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_restore_transform() {
        let mut ctx = RecordingContext::new(100, 100);
        ctx.save();
        ctx.translate(10.0, 20.0);
        ctx.scale(2.0, 2.0);
        assert_eq!(ctx.get_transform(), Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
        ctx.restore();
        assert_eq!(ctx.get_transform(), Matrix::identity());
    }

    #[test]
    fn test_point_in_path_uses_device_space() {
        let mut ctx = RecordingContext::new(100, 100);
        ctx.translate(50.0, 50.0);
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        assert!(ctx.is_point_in_path(55.0, 55.0));
        assert!(!ctx.is_point_in_path(5.0, 5.0));
    }

    #[test]
    fn test_put_then_get_image_data() {
        let mut ctx = RecordingContext::new(4, 4);
        let mut image = ImageData::new(1, 1);
        image.data.copy_from_slice(&[1, 2, 3, 4]);
        ctx.put_image_data(&image, 2, 3);
        assert_eq!(ctx.get_image_data(0, 0, 4, 4).pixel(2, 3), [1, 2, 3, 4]);
    }
}
