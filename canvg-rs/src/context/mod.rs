//! The drawing-surface capability the renderer draws through.
//!
//! The engine never rasterizes anything itself. It builds paths, sets paint
//! and line state, and asks a [`RenderingContext`] to fill, stroke, clip and
//! composite. Hosts implement the trait on top of their graphics backend.

mod accumulator;
mod recorder;

pub use accumulator::PathAccumulator;
pub use recorder::{DrawCall, RecordingContext};

use crate::color::Color;
use crate::geometry::Matrix;

/// Non-zero or even-odd winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn parse(value: &str) -> FillRule {
        match value {
            "evenodd" => FillRule::EvenOdd,
            _ => FillRule::NonZero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn parse(value: &str) -> Option<LineCap> {
        match value {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn parse(value: &str) -> Option<LineJoin> {
        match value {
            "miter" | "miter-clip" | "arcs" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

impl TextBaseline {
    /// Maps an SVG `dominant-baseline`/`alignment-baseline` keyword.
    pub fn from_svg(value: &str) -> Option<TextBaseline> {
        match value {
            "baseline" | "alphabetic" => Some(TextBaseline::Alphabetic),
            "before-edge" | "text-before-edge" => Some(TextBaseline::Top),
            "middle" | "central" => Some(TextBaseline::Middle),
            "after-edge" | "text-after-edge" => Some(TextBaseline::Bottom),
            "ideographic" => Some(TextBaseline::Ideographic),
            "hanging" => Some(TextBaseline::Hanging),
            "mathematical" => Some(TextBaseline::Alphabetic),
            _ => None,
        }
    }
}

/// How a pattern tile repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repetition {
    #[default]
    Repeat,
    NoRepeat,
}

/// A color stop at `offset` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

/// Straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// A fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Paint used for fills and strokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(Color),
    LinearGradient {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        x0: f64,
        y0: f64,
        r0: f64,
        x1: f64,
        y1: f64,
        r1: f64,
        stops: Vec<GradientStop>,
    },
    Pattern {
        image: std::sync::Arc<ImageData>,
        repetition: Repetition,
    },
}

impl Paint {
    pub fn transparent() -> Paint {
        Paint::Color(Color::TRANSPARENT)
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Paint::Color(color) => Some(*color),
            _ => None,
        }
    }

    /// True when nothing drawn with this paint could ever show.
    pub fn is_invisible(&self) -> bool {
        matches!(self, Paint::Color(color) if color.is_transparent())
    }
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Color(Color::BLACK)
    }
}

/// A 2D immediate-mode drawing surface.
///
/// Coordinates are user-space values mapped through the current transform.
/// Setters ignore values a browser canvas would ignore (non-finite widths,
/// negative dash segments and so on).
pub trait RenderingContext {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resizes the surface, clearing it and resetting all state.
    fn set_size(&mut self, width: u32, height: u32);

    fn save(&mut self);
    fn restore(&mut self);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill(&mut self, rule: FillRule);
    fn stroke(&mut self);
    fn clip(&mut self, rule: FillRule);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Hit-tests the current path in device space.
    fn is_point_in_path(&self, x: f64, y: f64) -> bool;

    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, x: f64, y: f64);
    /// Post-multiplies the current transform.
    fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
    fn set_transform(&mut self, matrix: Matrix);
    fn get_transform(&self) -> Matrix;

    fn fill_style(&self) -> Paint;
    fn set_fill_style(&mut self, paint: Paint);
    fn stroke_style(&self) -> Paint;
    fn set_stroke_style(&mut self, paint: Paint);

    fn line_width(&self) -> f64;
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f64);
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_line_dash_offset(&mut self, offset: f64);

    fn global_alpha(&self) -> f64;
    fn set_global_alpha(&mut self, alpha: f64);
    /// Returns false when the operation name is unknown.
    fn set_global_composite_operation(&mut self, operation: &str) -> bool;

    /// The current CSS font shorthand.
    fn font(&self) -> String;
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f64;

    /// Draws `image` into the destination rectangle under the current
    /// transform, alpha and clip.
    fn draw_image(&mut self, image: &ImageData, dx: f64, dy: f64, dw: f64, dh: f64);

    /// Reads device pixels; areas outside the surface read as transparent.
    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData;
    /// Writes device pixels directly, ignoring transform, alpha and clip.
    fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32);

    /// A fresh surface of the same kind, sharing fonts where possible.
    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn RenderingContext>;
}
