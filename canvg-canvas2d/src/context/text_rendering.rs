//! Text rendering operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::Canvas2dResult;
use crate::font_parser::parse_font;
use crate::text::{buffer_metrics, shape, text_x_offset, text_y_offset, TextMetrics};
use canvg_rs::context::{TextAlign, TextBaseline};
use cosmic_text::Command;
use tiny_skia::Transform;

impl Canvas2dContext {
    /// Sets the font from a CSS shorthand. Invalid strings leave the
    /// previous font in place.
    pub fn set_font(&mut self, font: &str) -> Canvas2dResult<()> {
        self.state.font = parse_font(font)?;
        self.state.font_css = font.trim().to_string();
        Ok(())
    }

    pub fn font(&self) -> &str {
        &self.state.font_css
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    pub fn measure_text(&mut self, text: &str) -> TextMetrics {
        crate::text::measure_text(&mut self.font_system, text, &self.state.font)
    }

    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        log::trace!(target: "canvas", "fillText \"{text}\" {x} {y}");
        self.render_text(text, x, y, true);
    }

    pub fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        log::trace!(target: "canvas", "strokeText \"{text}\" {x} {y}");
        self.render_text(text, x, y, false);
    }

    /// Draws each shaped glyph as a vector outline under the current
    /// transform and clip.
    fn render_text(&mut self, text: &str, x: f32, y: f32, fill: bool) {
        if text.is_empty() {
            return;
        }
        let font = self.state.font.clone();
        let buffer = shape(&mut self.font_system, text, &font);
        let metrics = buffer_metrics(&buffer, &font);

        let base_x = x + text_x_offset(metrics.width, self.state.text_align);
        let base_y = y + text_y_offset(metrics.ascent, metrics.descent, self.state.text_baseline);

        let mut glyphs = Vec::new();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((base_x, base_y), 1.0);
                let origin_x = base_x + glyph.x + glyph.font_size * glyph.x_offset;
                let origin_y = base_y + glyph.y - glyph.font_size * glyph.y_offset;
                glyphs.push((physical.cache_key, origin_x, origin_y));
            }
        }

        let transform = self.state.transform;
        let stroke = self.state.stroke();
        let style = if fill {
            self.state.fill_style.clone()
        } else {
            self.state.stroke_style.clone()
        };
        let _ = self.with_paint(&style, |ctx, paint| {
            let mask = ctx.state.clip_mask.clone();
            for (cache_key, origin_x, origin_y) in glyphs {
                let Some(commands) = ctx
                    .swash_cache
                    .get_outline_commands(&mut ctx.font_system, cache_key)
                else {
                    continue;
                };
                // Outlines are y-up.
                let mut pb = tiny_skia::PathBuilder::new();
                for command in commands {
                    match command {
                        Command::MoveTo(p) => pb.move_to(p.x, -p.y),
                        Command::LineTo(p) => pb.line_to(p.x, -p.y),
                        Command::QuadTo(c, p) => pb.quad_to(c.x, -c.y, p.x, -p.y),
                        Command::CurveTo(c1, c2, p) => {
                            pb.cubic_to(c1.x, -c1.y, c2.x, -c2.y, p.x, -p.y)
                        }
                        Command::Close => pb.close(),
                    }
                }
                let Some(path) = pb.finish() else {
                    continue;
                };
                let glyph_transform =
                    Transform::from_translate(origin_x, origin_y).post_concat(transform);
                if fill {
                    ctx.pixmap.fill_path(
                        &path,
                        paint,
                        tiny_skia::FillRule::Winding,
                        glyph_transform,
                        mask.as_deref(),
                    );
                } else {
                    ctx.pixmap
                        .stroke_path(&path, paint, &stroke, glyph_transform, mask.as_deref());
                }
            }
        });
    }
}
