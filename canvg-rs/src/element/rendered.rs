//! Paint, line, font and opacity state shared by every drawable element.

use super::{ElementKind, ElementRef};
use crate::color::Color;
use crate::context::{LineCap, LineJoin, Paint, RenderingContext};
use crate::font::Font;
use crate::geometry::PSEUDO_ZERO;
use crate::property::{Axis, Property};
use crate::transform::Transform;

pub(crate) fn set_context(element: ElementRef<'_>, ctx: &mut dyn RenderingContext, from_measure: bool) {
    if !from_measure {
        apply_paint(element, ctx);
        apply_line_style(element, ctx);
    }
    apply_font(element, ctx);
    if !from_measure {
        element.apply_effects(ctx);
        ctx.set_global_alpha(calculate_opacity(element));
    }
}

pub(crate) fn clear_context(element: ElementRef<'_>, _ctx: &mut dyn RenderingContext) {
    if element.node().modified_em_size.replace(false) {
        element.document().pop_em_size();
    }
}

fn apply_paint(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let fill = element.get_style("fill");
    let fill_opacity = element.get_style("fill-opacity");
    if let Some(paint) = resolve_paint(element, ctx, fill, &fill_opacity) {
        ctx.set_fill_style(paint);
    }
    if fill_opacity.has_value() {
        if let Some(color) = ctx.fill_style().as_color().filter(Color::is_opaque) {
            ctx.set_fill_style(Paint::Color(color.with_alpha(fill_opacity.get_number())));
        }
    }

    let stroke = element.get_style("stroke");
    let stroke_opacity = element.get_style("stroke-opacity");
    if let Some(paint) = resolve_paint(element, ctx, stroke, &stroke_opacity) {
        ctx.set_stroke_style(paint);
    }
    if stroke_opacity.has_value() {
        if let Some(color) = ctx.stroke_style().as_color().filter(Color::is_opaque) {
            ctx.set_stroke_style(Paint::Color(color.with_alpha(stroke_opacity.get_number())));
        }
    }
}

/// `None` leaves the current paint untouched.
fn resolve_paint<'d>(
    element: ElementRef<'d>,
    ctx: &mut dyn RenderingContext,
    mut paint: Property<'d>,
    opacity: &Property<'d>,
) -> Option<Paint> {
    if paint.is_url_definition() {
        return paint.get_fill_style_definition(ctx, element, opacity);
    }
    if !paint.has_value() {
        return None;
    }
    if paint.get_string() == "currentColor" {
        paint.set_value(element.get_style("color").get_color());
    }
    match paint.get_color().as_str() {
        "inherit" => None,
        "none" => Some(Paint::transparent()),
        value => match Color::parse(value) {
            Some(color) => Some(Paint::Color(color)),
            None => {
                log::debug!(target: "canvg::render", "unrecognized paint {value:?}");
                None
            }
        },
    }
}

fn apply_line_style(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let width = element.get_style("stroke-width");
    if width.has_value() {
        let pixels = width.get_pixels(Axis::Diagonal);
        ctx.set_line_width(if pixels == 0.0 { PSEUDO_ZERO } else { pixels });
    }

    if let Some(cap) = LineCap::parse(&element.get_style("stroke-linecap").get_string()) {
        ctx.set_line_cap(cap);
    }
    if let Some(join) = LineJoin::parse(&element.get_style("stroke-linejoin").get_string()) {
        ctx.set_line_join(join);
    }
    let miter_limit = element.get_style("stroke-miterlimit");
    if miter_limit.has_value() {
        ctx.set_miter_limit(miter_limit.get_number());
    }

    let dash_array = element.get_style("stroke-dasharray");
    if dash_array.has_value() && dash_array.get_string() != "none" {
        let document = element.document();
        let segments: Vec<f64> = dash_array
            .get_string()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| Property::new(document, "stroke-dasharray", part).get_pixels(Axis::Diagonal))
            .collect();
        ctx.set_line_dash(&segments);

        let offset = element.get_style("stroke-dashoffset");
        if offset.has_value() {
            ctx.set_line_dash_offset(offset.get_pixels(Axis::Diagonal));
        }
    }
}

fn apply_font(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let shorthand = element.get_style("font");
    let mut style = element.get_style("font-style");
    let mut variant = element.get_style("font-variant");
    let mut weight = element.get_style("font-weight");
    let mut size = element.get_style("font-size");
    let mut family = element.get_style("font-family");

    let inherited = Font::parse(&ctx.font(), None);
    let font = Font::new(
        &style.get_string(),
        &variant.get_string(),
        &weight.get_string(),
        &if size.has_value() {
            format!("{}px", size.get_font_size_pixels())
        } else {
            String::new()
        },
        &family.get_string(),
        Some(&Font::parse(&shorthand.get_string(), Some(&inherited))),
    );

    style.set_value(font.font_style.as_str());
    variant.set_value(font.font_variant.as_str());
    weight.set_value(font.font_weight.as_str());
    size.set_value(font.font_size.as_str());
    family.set_value(font.font_family.as_str());
    ctx.set_font(&font.to_string());

    if size.is_pixels() {
        element.document().push_em_size(size.get_pixels(Axis::Diagonal));
        element.node().modified_em_size.set(true);
    }
}

/// Own transform, then own clip-path. Skipped while the element is being
/// re-rendered for a mask or filter.
pub(crate) fn apply_effects(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    if element.node().effects_suspended.get() {
        return;
    }
    if let Some(transform) = Transform::from_element(element) {
        transform.apply(ctx);
    }
    let clip_path = element.get_own_style("clip-path");
    if clip_path.has_value() {
        match clip_path.get_definition() {
            Some(clip) if clip.kind() == ElementKind::ClipPath => {
                super::effects::apply_clip_path(clip, ctx);
            }
            Some(_) => {
                log::warn!(target: "canvg::render", "clip-path {} is not a clipPath", clip_path.get_string());
            }
            None => {
                log::debug!(target: "canvg::render", "unresolved clip-path {}", clip_path.get_string());
            }
        }
    }
}

pub(crate) fn calculate_opacity(element: ElementRef<'_>) -> f64 {
    std::iter::once(element)
        .chain(element.ancestors())
        .map(|el| el.get_own_style("opacity"))
        .filter(|opacity| opacity.has_value_with(true))
        .map(|opacity| opacity.get_number())
        .product()
}
