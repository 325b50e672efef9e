//! Marker instances placed at path vertices.

use super::ElementRef;
use crate::context::RenderingContext;
use crate::geometry::Point;
use crate::property::Value;
use std::f64::consts::PI;

/// Draws `marker` at `point`, oriented by `angle` when `orient` asks for it.
pub(crate) fn render(
    marker: ElementRef<'_>,
    ctx: &mut dyn RenderingContext,
    point: Point,
    angle: Option<f64>,
    is_start: bool,
) {
    let Some(wrapper) = marker.virtual_svg() else {
        return;
    };
    let orient = marker.get_attribute("orient");
    let rotation = match orient.get_string_or("auto").as_str() {
        "auto" => angle,
        "auto-start-reverse" if is_start => angle.map(|angle| angle + PI),
        "auto-start-reverse" => angle,
        _ => Some(orient.get_radians()),
    }
    .filter(|rotation| *rotation != 0.0);
    let stroke_units =
        marker.get_attribute("markerUnits").get_string_or("strokeWidth") == "strokeWidth";

    ctx.translate(point.x, point.y);
    if let Some(rotation) = rotation {
        ctx.rotate(rotation);
    }
    let line_width = ctx.line_width();
    if stroke_units {
        ctx.scale(line_width, line_width);
    }
    ctx.save();

    let copy = |from: &str, to: &str, default: Option<&str>| {
        let value = marker.get_attribute(from);
        if value.has_value() {
            wrapper.set_attribute(to, value.value().clone());
        } else if let Some(default) = default {
            wrapper.set_attribute(to, default);
        }
    };
    wrapper.node().reset();
    copy("viewBox", "viewBox", None);
    copy("refX", "refX", None);
    copy("refY", "refY", None);
    copy("markerWidth", "width", Some("3"));
    copy("markerHeight", "height", Some("3"));
    copy("overflow", "overflow", None);
    wrapper.set_attribute("fill", marker.get_attribute("fill").get_color_or("black"));
    wrapper.set_attribute(
        "stroke",
        Value::Text(marker.get_attribute("stroke").get_value_or("none")),
    );
    wrapper.render(ctx);

    ctx.restore();
    if stroke_units && line_width != 0.0 {
        ctx.scale(1.0 / line_width, 1.0 / line_width);
    }
    if let Some(rotation) = rotation {
        ctx.rotate(-rotation);
    }
    ctx.translate(-point.x, -point.y);
}

#[cfg(test)]
mod tests {
    use crate::context::{DrawCall, RecordingContext, RenderingContext};
    use crate::document::Document;
    use crate::geometry::Matrix;

    const SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg'>\
        <defs><marker id='m' markerWidth='4' markerHeight='4' refX='2' refY='2' orient='{orient}'>\
          <rect width='4' height='4'/></marker></defs>\
        <path d='M 10 10 L 50 10 L 50 50' stroke='black' marker-start='url(#m)' marker-mid='url(#m)' marker-end='url(#m)'/>\
      </svg>";

    fn render(orient: &str) -> RecordingContext {
        let doc = Document::from_string(&SVG.replace("{orient}", orient)).unwrap();
        let mut ctx = RecordingContext::new(100, 100);
        doc.screen.view_port_mut().set_current(100.0, 100.0);
        doc.root().render(&mut ctx);
        ctx
    }

    #[test]
    fn test_markers_at_each_vertex() {
        let ctx = render("auto");
        let fills = ctx
            .calls()
            .iter()
            .filter(|call| matches!(call, DrawCall::Fill(..)))
            .count();
        // The path itself plus three marker rects.
        assert_eq!(fills, 4);
        assert_eq!(ctx.stack_depth(), 0);
        assert!(ctx.get_transform().approx_eq(&Matrix::identity(), 1e-9));
    }

    #[test]
    fn test_fixed_orientation_restores_transform() {
        let ctx = render("45deg");
        assert!(ctx.get_transform().approx_eq(&Matrix::identity(), 1e-9));
    }
}
