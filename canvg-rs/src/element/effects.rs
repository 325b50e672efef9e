//! `<mask>`, `<filter>` with its primitives, and `<clipPath>`.

use super::{ElementData, ElementKind, ElementRef};
use crate::context::{FillRule, PathAccumulator, RenderingContext};
use crate::filters::{self, ColorMatrixValues};
use crate::geometry::BoundingBox;
use crate::property::Axis;
use crate::transform::Transform;

/// Largest offscreen surface a mask, filter or paint server may allocate
/// per side.
pub const MAX_OFFSCREEN_SIZE: u32 = 4096;

/// A parsed `feColorMatrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatrix {
    pub matrix: ColorMatrixValues,
    pub include_opacity: bool,
}

impl ColorMatrix {
    pub fn new(kind: &str, values: &[f64], include_opacity: bool) -> Self {
        Self {
            matrix: filters::color_matrix_for(kind, values),
            include_opacity,
        }
    }

    pub fn luminance_to_alpha() -> Self {
        Self {
            matrix: filters::LUMINANCE_TO_ALPHA_MATRIX,
            include_opacity: true,
        }
    }

    /// Rewrites the `width` x `height` pixels at the surface origin.
    pub fn apply(&self, ctx: &mut dyn RenderingContext, width: u32, height: u32) {
        let mut image = ctx.get_image_data(0, 0, width, height);
        filters::apply_color_matrix(&mut image, &self.matrix, self.include_opacity);
        ctx.put_image_data(&image, 0, 0);
    }
}

/// Pixel size of an offscreen side, clamped to [`MAX_OFFSCREEN_SIZE`].
pub(crate) fn offscreen_size(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.ceil() as u32).min(MAX_OFFSCREEN_SIZE)
}

/// Draws `element` through the luminance of `mask`'s content.
pub(crate) fn apply_mask(
    mask: ElementRef<'_>,
    ctx: &mut dyn RenderingContext,
    element: ElementRef<'_>,
) {
    let document = mask.document();
    let mut x = mask.get_attribute("x").get_pixels(Axis::X);
    let mut y = mask.get_attribute("y").get_pixels(Axis::Y);
    let mut width = mask.get_attribute("width").get_pixels(Axis::X);
    let mut height = mask.get_attribute("height").get_pixels(Axis::Y);

    if width == 0.0 && height == 0.0 {
        let mut bbox = BoundingBox::empty();
        for child in mask.children() {
            bbox.add_bounding_box(child.get_bounding_box(ctx).as_ref());
        }
        if bbox.is_empty() {
            log::debug!(target: "canvg::render", "mask has no content");
            return;
        }
        x = bbox.x1.floor();
        y = bbox.y1.floor();
        width = bbox.width().floor();
        height = bbox.height().floor();
    }

    let canvas_width = offscreen_size(x + width);
    let canvas_height = offscreen_size(y + height);
    if canvas_width == 0 || canvas_height == 0 {
        return;
    }

    let mut mask_ctx = ctx.create_offscreen(canvas_width, canvas_height);
    document.screen.set_defaults(mask_ctx.as_mut());
    mask.render_each_child(mask_ctx.as_mut());
    ColorMatrix::luminance_to_alpha().apply(mask_ctx.as_mut(), canvas_width, canvas_height);

    let mut content_ctx = ctx.create_offscreen(canvas_width, canvas_height);
    document.screen.set_defaults(content_ctx.as_mut());
    element.with_effects_suspended(|| element.render(content_ctx.as_mut()));

    let mut content = content_ctx.get_image_data(0, 0, canvas_width, canvas_height);
    let alpha = mask_ctx.get_image_data(0, 0, canvas_width, canvas_height);
    filters::multiply_alpha(&mut content, &alpha);

    ctx.draw_image(
        &content,
        0.0,
        0.0,
        f64::from(canvas_width),
        f64::from(canvas_height),
    );
}

/// Pixels a primitive may spread content beyond the element's bounds.
fn extra_filter_distance(primitive: ElementRef<'_>) -> f64 {
    match &primitive.node().data {
        ElementData::GaussianBlur(std_deviation) => std_deviation.floor().max(0.0),
        _ => 0.0,
    }
}

fn apply_primitive(primitive: ElementRef<'_>, ctx: &mut dyn RenderingContext, width: u32, height: u32) {
    match &primitive.node().data {
        ElementData::ColorMatrix(matrix) => matrix.apply(ctx, width, height),
        ElementData::GaussianBlur(std_deviation) => {
            let mut image = ctx.get_image_data(0, 0, width, height);
            filters::gaussian_blur(&mut image, *std_deviation);
            ctx.put_image_data(&image, 0, 0);
        }
        ElementData::UnsupportedPrimitive(warned) => {
            if !warned.replace(true) {
                log::warn!(
                    target: "canvg::filter",
                    "<{}> is not implemented and leaves its input unchanged",
                    primitive.tag()
                );
            }
        }
        _ => {}
    }
}

/// Renders `element` offscreen, runs each filter primitive over the pixels
/// and blits the result back.
pub(crate) fn apply_filter(
    filter: ElementRef<'_>,
    ctx: &mut dyn RenderingContext,
    element: ElementRef<'_>,
) {
    let Some(bbox) = element.get_bounding_box(ctx) else {
        log::debug!(target: "canvg::filter", "filtered <{}> has no bounds", element.tag());
        return;
    };
    let x = bbox.x1.floor();
    let y = bbox.y1.floor();
    let width = bbox.width().floor();
    let height = bbox.height().floor();

    let primitives: Vec<_> = filter
        .children()
        .filter(|child| child.kind().is_filter_primitive())
        .collect();
    let distance = primitives
        .iter()
        .map(|primitive| extra_filter_distance(*primitive))
        .fold(0.0, f64::max);

    let canvas_width = offscreen_size(width + 2.0 * distance);
    let canvas_height = offscreen_size(height + 2.0 * distance);
    if canvas_width == 0 || canvas_height == 0 {
        return;
    }

    let document = filter.document();
    let mut filter_ctx = ctx.create_offscreen(canvas_width, canvas_height);
    document.screen.set_defaults(filter_ctx.as_mut());
    filter_ctx.translate(-x + distance, -y + distance);
    element.with_effects_suspended(|| element.render(filter_ctx.as_mut()));

    for primitive in primitives {
        apply_primitive(primitive, filter_ctx.as_mut(), canvas_width, canvas_height);
    }

    let image = filter_ctx.get_image_data(0, 0, canvas_width, canvas_height);
    ctx.draw_image(
        &image,
        x - distance,
        y - distance,
        f64::from(canvas_width),
        f64::from(canvas_height),
    );
}

/// Intersects the current clip with the union of `clip`'s children.
pub(crate) fn apply_clip_path(clip: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    ctx.begin_path();
    let mut rule = FillRule::NonZero;
    {
        let mut accumulator = PathAccumulator::new(ctx);
        for child in clip.children().filter(|child| child.has_path()) {
            let source = if child.kind() == ElementKind::Use {
                super::structure::use_target(child).unwrap_or(child)
            } else {
                child
            };
            let transform = Transform::from_element(source);
            if let Some(transform) = &transform {
                transform.apply(&mut accumulator);
            }
            child.path(Some(&mut accumulator));
            if let Some(transform) = &transform {
                transform.unapply(&mut accumulator);
            }
            if child.get_style("clip-rule").get_string() == "evenodd" {
                rule = FillRule::EvenOdd;
            }
        }
    }
    ctx.close_path();
    ctx.clip(rule);
}
