//! Mapping the renderer's drawing enums onto tiny-skia.

use canvg_rs::color::Color;
use canvg_rs::context::{FillRule, LineCap, LineJoin};
use canvg_rs::geometry::Matrix;
use tiny_skia::{BlendMode, Transform};

pub(crate) fn fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

pub(crate) fn line_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

pub(crate) fn line_join(join: LineJoin) -> tiny_skia::LineJoin {
    match join {
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

/// Canvas `globalCompositeOperation` names.
pub(crate) fn blend_mode(operation: &str) -> Option<BlendMode> {
    let mode = match operation {
        "source-over" => BlendMode::SourceOver,
        "source-in" => BlendMode::SourceIn,
        "source-out" => BlendMode::SourceOut,
        "source-atop" => BlendMode::SourceAtop,
        "destination-over" => BlendMode::DestinationOver,
        "destination-in" => BlendMode::DestinationIn,
        "destination-out" => BlendMode::DestinationOut,
        "destination-atop" => BlendMode::DestinationAtop,
        "lighter" => BlendMode::Plus,
        "copy" => BlendMode::Source,
        "xor" => BlendMode::Xor,
        "multiply" => BlendMode::Multiply,
        "screen" => BlendMode::Screen,
        "overlay" => BlendMode::Overlay,
        "darken" => BlendMode::Darken,
        "lighten" => BlendMode::Lighten,
        "color-dodge" => BlendMode::ColorDodge,
        "color-burn" => BlendMode::ColorBurn,
        "hard-light" => BlendMode::HardLight,
        "soft-light" => BlendMode::SoftLight,
        "difference" => BlendMode::Difference,
        "exclusion" => BlendMode::Exclusion,
        "hue" => BlendMode::Hue,
        "saturation" => BlendMode::Saturation,
        "color" => BlendMode::Color,
        "luminosity" => BlendMode::Luminosity,
        _ => return None,
    };
    Some(mode)
}

/// Straight-alpha color with `alpha` multiplied in.
pub(crate) fn skia_color(color: Color, alpha: f32) -> tiny_skia::Color {
    let mut skia = tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255);
    skia.set_alpha((color.a as f32 * alpha).clamp(0.0, 1.0));
    skia
}

pub(crate) fn to_transform(matrix: &Matrix) -> Transform {
    Transform::from_row(
        matrix.a as f32,
        matrix.b as f32,
        matrix.c as f32,
        matrix.d as f32,
        matrix.e as f32,
        matrix.f as f32,
    )
}

pub(crate) fn to_matrix(transform: &Transform) -> Matrix {
    Matrix::new(
        transform.sx as f64,
        transform.ky as f64,
        transform.kx as f64,
        transform.sy as f64,
        transform.tx as f64,
        transform.ty as f64,
    )
}

/// Parses a CSS color for host-facing setters such as a background fill.
pub(crate) fn parse_css_color(value: &str) -> crate::Canvas2dResult<Color> {
    let parsed = csscolorparser::parse(value)
        .map_err(|err| crate::Canvas2dError::InvalidColor(format!("{value}: {err}")))?;
    let [r, g, b, a] = parsed.to_rgba8();
    Ok(Color::rgba(r, g, b, a as f64 / 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_round_trips_matrix_order() {
        let matrix = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let transform = to_transform(&matrix);
        assert_eq!((transform.sx, transform.ky, transform.kx), (1.0, 2.0, 3.0));
        assert_eq!(to_matrix(&transform), matrix);
    }

    #[test]
    fn test_blend_mode_names() {
        assert_eq!(blend_mode("destination-in"), Some(BlendMode::DestinationIn));
        assert_eq!(blend_mode("lighter"), Some(BlendMode::Plus));
        assert_eq!(blend_mode("bogus"), None);
    }

    #[test]
    fn test_skia_color_applies_alpha() {
        let color = skia_color(Color::rgba(255, 0, 0, 0.5), 0.5);
        assert!((color.alpha() - 0.25).abs() < 1e-6);
        assert_eq!(color.red(), 1.0);
    }

    #[test]
    fn test_parse_css_color() {
        assert_eq!(parse_css_color("#00ff00").unwrap(), Color::rgb(0, 255, 0));
        assert!(parse_css_color("not-a-color").is_err());
    }
}
