//! Text shaping and measurement using cosmic-text.

use crate::font_parser::ParsedFont;
use canvg_rs::context::{TextAlign, TextBaseline};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};

/// What `measureText()` reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    /// Distance from the alphabetic baseline up to the top of the line box.
    pub ascent: f32,
    /// Distance from the alphabetic baseline down to the bottom of the line box.
    pub descent: f32,
}

/// The first family in the list that is generic or installed.
pub(crate) fn resolve_family<'a>(font_system: &FontSystem, families: &'a [String]) -> Family<'a> {
    for name in families {
        let family = match name.to_ascii_lowercase().as_str() {
            "serif" => Family::Serif,
            "sans-serif" => Family::SansSerif,
            "monospace" => Family::Monospace,
            "cursive" => Family::Cursive,
            "fantasy" => Family::Fantasy,
            _ => {
                let installed = font_system.db().faces().any(|face| {
                    face.families
                        .iter()
                        .any(|(family, _)| family.eq_ignore_ascii_case(name))
                });
                if !installed {
                    log::trace!(target: "canvas", "font family {name} not installed");
                    continue;
                }
                Family::Name(name)
            }
        };
        return family;
    }
    Family::SansSerif
}

/// Shapes `text` on a single line.
pub(crate) fn shape(font_system: &mut FontSystem, text: &str, font: &ParsedFont) -> Buffer {
    let metrics = Metrics::new(font.size_px, font.size_px * 1.2);
    let mut buffer = Buffer::new(font_system, metrics);

    let family = resolve_family(font_system, &font.families);
    let attrs = Attrs::new()
        .family(family)
        .weight(font.weight)
        .style(font.style);
    buffer.set_text(font_system, text, &attrs, Shaping::Advanced, None);
    buffer.shape_until_scroll(font_system, false);
    buffer
}

pub(crate) fn buffer_metrics(buffer: &Buffer, font: &ParsedFont) -> TextMetrics {
    let mut metrics = TextMetrics::default();
    for run in buffer.layout_runs() {
        metrics.width = metrics.width.max(run.line_w);
        metrics.ascent = metrics.ascent.max(run.line_y - run.line_top);
        metrics.descent = metrics
            .descent
            .max(run.line_top + run.line_height - run.line_y);
    }
    if metrics.ascent == 0.0 && metrics.descent == 0.0 {
        metrics.ascent = font.size_px * 0.8;
        metrics.descent = font.size_px * 0.2;
    }
    metrics
}

pub fn measure_text(font_system: &mut FontSystem, text: &str, font: &ParsedFont) -> TextMetrics {
    let buffer = shape(font_system, text, font);
    buffer_metrics(&buffer, font)
}

/// Horizontal shift from the anchor to the start of the text.
pub(crate) fn text_x_offset(width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left | TextAlign::Start => 0.0,
        TextAlign::Right | TextAlign::End => -width,
        TextAlign::Center => -width / 2.0,
    }
}

/// Vertical shift from the anchor to the alphabetic baseline.
pub(crate) fn text_y_offset(ascent: f32, descent: f32, baseline: TextBaseline) -> f32 {
    match baseline {
        TextBaseline::Top => ascent,
        TextBaseline::Hanging => ascent * 0.8,
        TextBaseline::Middle => (ascent - descent) / 2.0,
        TextBaseline::Alphabetic => 0.0,
        TextBaseline::Ideographic => -descent * 0.5,
        TextBaseline::Bottom => -descent,
    }
}
