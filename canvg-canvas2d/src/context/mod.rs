//! Canvas 2D rendering context implementation.

mod drawing;
mod host;
mod image_ops;
mod path_ops;
mod text_rendering;
mod transform;

use crate::drawing_state::DrawingState;
use crate::error::{Canvas2dError, Canvas2dResult};
use crate::font_config::{font_config_to_fontdb, FontConfig};
use canvg_rs::context::{LineCap, LineJoin, Paint};
use cosmic_text::{FontSystem, SwashCache};
use tiny_skia::Pixmap;

/// Maximum canvas dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// Builder for a [`Canvas2dContext`] with explicit fonts.
pub struct Canvas2dContextBuilder {
    width: u32,
    height: u32,
    font_config: FontConfig,
    font_db: Option<fontdb::Database>,
}

impl Canvas2dContextBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font_config: FontConfig::default(),
            font_db: None,
        }
    }

    pub fn font_config(mut self, config: FontConfig) -> Self {
        self.font_config = config;
        self
    }

    /// Use an already built font database instead of resolving a config.
    pub fn font_db(mut self, db: fontdb::Database) -> Self {
        self.font_db = Some(db);
        self
    }

    pub fn build(self) -> Canvas2dResult<Canvas2dContext> {
        let db = match self.font_db {
            Some(db) => db,
            None => font_config_to_fontdb(&self.font_config),
        };
        Canvas2dContext::new_internal(self.width, self.height, db)
    }
}

/// A tiny-skia pixel buffer driven through the canvas 2D drawing model.
pub struct Canvas2dContext {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Premultiplied RGBA pixels.
    pub(crate) pixmap: Pixmap,
    pub(crate) font_system: FontSystem,
    pub(crate) swash_cache: SwashCache,
    pub(crate) state: DrawingState,
    state_stack: Vec<DrawingState>,
    /// Current path, already mapped to device space.
    pub(crate) path_builder: tiny_skia::PathBuilder,
    /// Device-space current point, if the path has one.
    pub(crate) current_point: Option<(f32, f32)>,
    pub(crate) subpath_start: (f32, f32),
}

impl Canvas2dContext {
    /// A canvas with system fonts and the default generic family mappings.
    pub fn new(width: u32, height: u32) -> Canvas2dResult<Self> {
        Canvas2dContextBuilder::new(width, height).build()
    }

    pub fn with_config(width: u32, height: u32, config: FontConfig) -> Canvas2dResult<Self> {
        Canvas2dContextBuilder::new(width, height)
            .font_config(config)
            .build()
    }

    pub fn builder(width: u32, height: u32) -> Canvas2dContextBuilder {
        Canvas2dContextBuilder::new(width, height)
    }

    fn new_internal(width: u32, height: u32, font_db: fontdb::Database) -> Canvas2dResult<Self> {
        let pixmap = new_pixmap(width, height)?;
        let font_system = FontSystem::new_with_locale_and_db("en".to_string(), font_db);
        log::debug!(target: "canvas", "new canvas {width}x{height}");

        Ok(Self {
            width,
            height,
            pixmap,
            font_system,
            swash_cache: SwashCache::new(),
            state: DrawingState::default(),
            state_stack: Vec::new(),
            path_builder: tiny_skia::PathBuilder::new(),
            current_point: None,
            subpath_start: (0.0, 0.0),
        })
    }

    /// A blank canvas of another size sharing this canvas's fonts.
    pub fn create_offscreen_canvas(&self, width: u32, height: u32) -> Canvas2dResult<Self> {
        Self::new_internal(width, height, self.font_system.db().clone())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixels in row-major RGBA order.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Resizes the canvas. Like setting a canvas element's width, this
    /// clears the pixels and resets all drawing state.
    pub fn resize(&mut self, width: u32, height: u32) -> Canvas2dResult<()> {
        self.pixmap = new_pixmap(width, height)?;
        self.width = width;
        self.height = height;
        self.reset_state();
        Ok(())
    }

    pub fn save(&mut self) {
        log::trace!(target: "canvas", "save");
        self.state_stack.push(self.state.clone());
    }

    /// Restores the last saved state. Unbalanced calls are ignored.
    pub fn restore(&mut self) {
        log::trace!(target: "canvas", "restore");
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    /// Clears the canvas to transparent and resets all drawing state.
    pub fn reset(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.state = DrawingState::default();
        self.state_stack.clear();
        self.path_builder = tiny_skia::PathBuilder::new();
        self.current_point = None;
        self.subpath_start = (0.0, 0.0);
    }

    // --- Style setters ---

    /// Set the fill style from a CSS color string.
    pub fn set_fill_style(&mut self, style: &str) -> Canvas2dResult<()> {
        self.state.fill_style = Paint::Color(crate::style::parse_css_color(style)?);
        Ok(())
    }

    pub fn set_fill_paint(&mut self, paint: Paint) {
        self.state.fill_style = paint;
    }

    /// Set the stroke style from a CSS color string.
    pub fn set_stroke_style(&mut self, style: &str) -> Canvas2dResult<()> {
        self.state.stroke_style = Paint::Color(crate::style::parse_css_color(style)?);
        Ok(())
    }

    pub fn set_stroke_paint(&mut self, paint: Paint) {
        self.state.stroke_style = paint;
    }

    /// Ignores non-finite or non-positive widths.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    /// Ignores non-finite or non-positive limits.
    pub fn set_miter_limit(&mut self, limit: f32) {
        if limit.is_finite() && limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    /// Ignores values outside `[0, 1]` rather than clamping them.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// Returns false and keeps the previous mode for unknown names.
    pub fn set_global_composite_operation(&mut self, operation: &str) -> bool {
        match crate::style::blend_mode(operation) {
            Some(mode) => {
                self.state.global_composite_operation = mode;
                true
            }
            None => {
                log::debug!(target: "canvas", "ignoring composite operation {operation}");
                false
            }
        }
    }

    /// Ignores the whole call when any segment is negative or non-finite.
    /// Odd-length lists are repeated to make them even.
    pub fn set_line_dash(&mut self, mut segments: Vec<f32>) {
        if segments.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return;
        }
        if segments.len() % 2 == 1 {
            segments.extend_from_within(..);
        }
        self.state.line_dash = segments;
    }

    pub fn get_line_dash(&self) -> &[f32] {
        &self.state.line_dash
    }

    pub fn set_line_dash_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.line_dash_offset = offset;
        }
    }
}

fn new_pixmap(width: u32, height: u32) -> Canvas2dResult<Pixmap> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Canvas2dError::InvalidDimensions { width, height });
    }
    Pixmap::new(width, height).ok_or(Canvas2dError::InvalidDimensions { width, height })
}

#[cfg(test)]
pub(crate) fn test_canvas(width: u32, height: u32) -> Canvas2dContext {
    Canvas2dContext::builder(width, height)
        .font_config(FontConfig::empty())
        .build()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvg_rs::color::Color;

    #[test]
    fn test_new_context_defaults() {
        let ctx = test_canvas(200, 150);
        assert_eq!(ctx.width(), 200);
        assert_eq!(ctx.height(), 150);
        assert_eq!(ctx.state.line_width, 1.0);
        assert_eq!(ctx.state.global_alpha, 1.0);
        assert_eq!(ctx.state.miter_limit, 10.0);
        assert!(ctx.state.line_dash.is_empty());
        assert!(ctx.state.clip_mask.is_none());
        assert!(ctx.pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_dimensions() {
        for (width, height) in [(0, 100), (100, 0), (MAX_DIMENSION + 1, 1)] {
            assert!(matches!(
                Canvas2dContext::builder(width, height)
                    .font_config(FontConfig::empty())
                    .build(),
                Err(Canvas2dError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_setters_ignore_invalid_values() {
        let mut ctx = test_canvas(10, 10);
        ctx.set_line_width(5.0);
        ctx.set_line_width(-1.0);
        ctx.set_line_width(f32::NAN);
        assert_eq!(ctx.state.line_width, 5.0);

        ctx.set_global_alpha(0.5);
        ctx.set_global_alpha(2.0);
        assert_eq!(ctx.state.global_alpha, 0.5);

        ctx.set_miter_limit(0.0);
        assert_eq!(ctx.state.miter_limit, 10.0);

        assert!(ctx.set_global_composite_operation("multiply"));
        assert!(!ctx.set_global_composite_operation("invalid-mode"));
        assert_eq!(
            ctx.state.global_composite_operation,
            tiny_skia::BlendMode::Multiply
        );
    }

    #[test]
    fn test_line_dash() {
        let mut ctx = test_canvas(10, 10);
        ctx.set_line_dash(vec![5.0, 10.0, 15.0]);
        assert_eq!(ctx.get_line_dash(), &[5.0, 10.0, 15.0, 5.0, 10.0, 15.0]);
        ctx.set_line_dash(vec![5.0, -1.0]);
        assert_eq!(ctx.get_line_dash().len(), 6);
        ctx.set_line_dash(vec![]);
        assert!(ctx.get_line_dash().is_empty());
    }

    #[test]
    fn test_save_restore_and_unbalanced_restore() {
        let mut ctx = test_canvas(10, 10);
        ctx.set_fill_style("#ff0000").unwrap();
        ctx.save();
        ctx.set_fill_style("blue").unwrap();
        ctx.restore();
        ctx.restore();
        assert_eq!(ctx.state.fill_style, Paint::Color(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_resize_clears_state() {
        let mut ctx = test_canvas(10, 10);
        ctx.set_line_width(4.0);
        ctx.save();
        ctx.resize(20, 5).unwrap();
        assert_eq!((ctx.width(), ctx.height()), (20, 5));
        assert_eq!(ctx.state.line_width, 1.0);
        assert!(ctx.state_stack.is_empty());
        assert!(ctx.resize(0, 5).is_err());
        assert_eq!(ctx.width(), 20);
    }

    #[test]
    fn test_bad_css_color_is_an_error() {
        let mut ctx = test_canvas(10, 10);
        assert!(matches!(
            ctx.set_fill_style("nope"),
            Err(Canvas2dError::InvalidColor(_))
        ));
    }
}
