//! `<svg>` viewports and `<use>` instancing.

use super::{ElementKind, ElementRef};
use crate::context::RenderingContext;
use crate::property::{Axis, Value};
use crate::util::to_numbers;
use crate::view_box::ViewBoxParams;

/// Deepest chain of nested `<use>` renders before giving up.
const MAX_USE_DEPTH: usize = 64;

pub(crate) fn svg_set_context(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let document = element.document();
    let node = element.node();
    document.screen.set_defaults(ctx);

    for axis_attribute in ["x", "y"] {
        if !element.get_attribute(axis_attribute).has_value() {
            element.ensure_attribute(axis_attribute).set_value(0.0);
        }
    }
    for (name, default) in [("width", "100%"), ("height", "100%")] {
        if !element.get_own_style(name).has_value() {
            element.get_style_with(name, true, true).set_value(default);
        }
    }
    if !element.get_style("color").has_value() {
        element.get_style_with("color", true, false).set_value("black");
    }

    let view_box_attr = element.get_attribute("viewBox");
    let view_box = view_box_attr
        .has_value()
        .then(|| to_numbers(&view_box_attr.get_string()))
        .filter(|numbers| numbers.len() >= 4);
    let clip = !node.is_root && element.get_style("overflow").get_value_or("hidden") != "visible";

    let (mut min_x, mut min_y, mut clip_x, mut clip_y) = (0.0, 0.0, 0.0, 0.0);
    if let Some(view_box) = &view_box {
        min_x = view_box[0];
        min_y = view_box[1];
    }

    let (mut width, mut height) = {
        let view_port = document.screen.view_port();
        (view_port.width(), view_port.height())
    };
    if !node.is_root {
        width = element.get_own_style("width").get_pixels(Axis::X);
        height = element.get_own_style("height").get_pixels(Axis::Y);
        if node.virtual_of == Some(ElementKind::Marker) {
            clip_x = min_x;
            clip_y = min_y;
            min_x = 0.0;
            min_y = 0.0;
        }
    }
    document.screen.view_port_mut().set_current(width, height);

    if node.virtual_of.is_none()
        && element.parent().is_none()
        && element.get_own_style("transform").has_value()
        && !element.get_own_style("transform-origin").has_value()
    {
        element
            .get_style_with("transform-origin", true, true)
            .set_value("50% 50%");
    }

    super::rendered::set_context(element, ctx, false);

    ctx.translate(
        element.get_attribute("x").get_pixels(Axis::X),
        element.get_attribute("y").get_pixels(Axis::Y),
    );

    let (desired_width, desired_height) = match &view_box {
        Some(view_box) => (view_box[2], view_box[3]),
        None => (width, height),
    };
    let ref_x = element.get_attribute("refX");
    let ref_y = element.get_attribute("refY");
    let aspect_ratio = element.get_attribute("preserveAspectRatio").get_string();
    let (view_port_width, view_port_height) = {
        let view_port = document.screen.view_port();
        (view_port.width(), view_port.height())
    };
    document.set_view_box(
        ctx,
        &ViewBoxParams {
            aspect_ratio: &aspect_ratio,
            width: view_port_width,
            desired_width,
            height: view_port_height,
            desired_height,
            min_x,
            min_y,
            ref_x: ref_x.has_value().then(|| ref_x.get_pixels(Axis::X)),
            ref_y: ref_y.has_value().then(|| ref_y.get_pixels(Axis::Y)),
            clip,
            clip_x,
            clip_y,
        },
    );

    if view_box.is_some() {
        let mut view_port = document.screen.view_port_mut();
        view_port.remove_current();
        view_port.set_current(desired_width, desired_height);
    }
}

pub(crate) fn svg_clear_context(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    super::rendered::clear_context(element, ctx);
    element.document().screen.view_port_mut().remove_current();
}

pub(crate) fn use_target<'d>(element: ElementRef<'d>) -> Option<ElementRef<'d>> {
    element.get_href_attribute().get_definition()
}

pub(crate) fn use_set_context(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    super::rendered::set_context(element, ctx, false);
    let x = element.get_attribute("x");
    if x.has_value() {
        ctx.translate(x.get_pixels(Axis::X), 0.0);
    }
    let y = element.get_attribute("y");
    if y.has_value() {
        ctx.translate(0.0, y.get_pixels(Axis::Y));
    }
}

pub(crate) fn use_render_children(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let Some(target) = use_target(element) else {
        log::debug!(
            target: "canvg::render",
            "use references missing element {}",
            element.get_href_attribute().get_string()
        );
        return;
    };
    let document = element.document();
    let depth = document.use_depth.get();
    if depth >= MAX_USE_DEPTH {
        log::warn!(
            target: "canvg::render",
            "use nesting deeper than {MAX_USE_DEPTH}, skipping {}",
            element.get_href_attribute().get_string()
        );
        return;
    }

    let mut instance = target;
    let symbol = target.kind() == ElementKind::Symbol;
    if symbol {
        let Some(wrapper) = target.virtual_svg() else {
            return;
        };
        wrapper.node().reset();
        for name in ["viewBox", "preserveAspectRatio", "overflow"] {
            let value = target.get_attribute(name);
            if value.has_value() {
                wrapper.set_attribute(name, value.get_string());
            }
        }
        instance = wrapper;
    }

    if instance.kind() == ElementKind::Svg {
        for name in ["width", "height"] {
            let size = element.get_own_style(name);
            if size.has_value() {
                instance.node().remove_style(name);
                instance.set_attribute(name, Value::Text(size.get_string()));
            }
        }
    }

    let old_parent = instance.node().parent.get();
    let old_symbol_parent = symbol.then(|| target.node().parent.get());
    instance.set_parent(Some(element.id()));
    if symbol {
        target.set_parent(Some(element.id()));
    }
    document.use_depth.set(depth + 1);

    instance.render(ctx);

    document.use_depth.set(depth);
    instance.set_parent(old_parent);
    if let Some(parent) = old_symbol_parent {
        target.set_parent(parent);
    }
}

/// Sets the root size, keeping the original coordinate system through a
/// viewBox when the document had none.
pub(crate) fn svg_resize(
    element: ElementRef<'_>,
    width: f64,
    height: f64,
    preserve_aspect_ratio: Option<&str>,
) {
    let mut width_attribute = element.ensure_attribute("width");
    let mut height_attribute = element.ensure_attribute("height");
    let origin_width = width_attribute.get_number_or(0.0);
    let origin_height = height_attribute.get_number_or(0.0);

    if let Some(preserve_aspect_ratio) = preserve_aspect_ratio {
        element
            .ensure_attribute("preserveAspectRatio")
            .set_value(preserve_aspect_ratio.trim());
    }
    width_attribute.set_value(width);
    height_attribute.set_value(height);

    if !element.get_attribute("viewBox").has_value() {
        let or = |origin: f64, size: f64| if origin != 0.0 { origin } else { size };
        element.ensure_attribute("viewBox").set_value(format!(
            "0 0 {} {}",
            crate::property::format_number(or(origin_width, width)),
            crate::property::format_number(or(origin_height, height))
        ));
    }

    if element.get_attribute("style").has_value() {
        for (name, size) in [("width", width), ("height", height)] {
            let mut style = element.get_own_style(name);
            if style.has_value() {
                style.set_value(format!("{}px", crate::property::format_number(size)));
            }
        }
    }
}
