//! Drawing state that can be saved and restored.

use crate::font_parser::ParsedFont;
use canvg_rs::context::{LineCap, LineJoin, Paint, TextAlign, TextBaseline};
use std::sync::Arc;
use tiny_skia::Transform;

#[derive(Debug, Clone)]
pub(crate) struct DrawingState {
    pub fill_style: Paint,
    pub stroke_style: Paint,
    pub line_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    /// Always even length.
    pub line_dash: Vec<f32>,
    pub line_dash_offset: f32,
    pub font: ParsedFont,
    /// The shorthand exactly as last accepted.
    pub font_css: String,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub global_alpha: f32,
    pub global_composite_operation: tiny_skia::BlendMode,
    pub transform: Transform,
    /// Device-space coverage of every clip applied so far. Shared between
    /// saved states until the next clip copies it.
    pub clip_mask: Option<Arc<tiny_skia::Mask>>,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: Paint::default(),
            stroke_style: Paint::default(),
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            font: ParsedFont::default(),
            font_css: "10px sans-serif".to_string(),
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
            global_alpha: 1.0,
            global_composite_operation: tiny_skia::BlendMode::SourceOver,
            transform: Transform::identity(),
            clip_mask: None,
        }
    }
}

impl DrawingState {
    pub fn stroke(&self) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: self.line_width,
            line_cap: crate::style::line_cap(self.line_cap),
            line_join: crate::style::line_join(self.line_join),
            miter_limit: self.miter_limit,
            dash: if self.line_dash.is_empty() {
                None
            } else {
                tiny_skia::StrokeDash::new(self.line_dash.clone(), self.line_dash_offset)
            },
        }
    }
}
