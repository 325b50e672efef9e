//! `<path>` geometry and the fill/stroke/marker pass shared by all shapes.

use super::{ElementData, ElementKind, ElementRef, Marker};
use crate::context::{FillRule, RenderingContext};
use crate::geometry::{BoundingBox, Matrix, Point};
use crate::path_parser::{PathCommand, PathParser};
use std::f64::consts::{PI, TAU};

/// Builds the shape, hit-tests it, then fills, strokes and places markers.
pub(crate) fn render_shape(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    if element.path(Some(ctx)).is_none() {
        return;
    }
    let document = element.document();
    document.screen.check_path(element, ctx);

    if !ctx.fill_style().is_invisible() {
        let rule = element.get_style("fill-rule").get_string_or("inherit");
        ctx.fill(if rule == "inherit" {
            FillRule::NonZero
        } else {
            FillRule::parse(&rule)
        });
    }

    if !ctx.stroke_style().is_invisible() {
        if element.get_attribute("vector-effect").get_string() == "non-scaling-stroke" {
            ctx.save();
            ctx.set_transform(Matrix::identity());
            ctx.stroke();
            ctx.restore();
        } else {
            ctx.stroke();
        }
    }

    render_markers(element, ctx);
}

fn render_markers(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let Some(markers) = element.get_markers() else {
        return;
    };
    let Some(last) = markers.len().checked_sub(1) else {
        return;
    };
    let resolve = |name: &str| {
        let property = element.get_style(name);
        if !property.is_url_definition() {
            return None;
        }
        let definition = property.get_definition();
        if definition.is_none() {
            log::debug!(target: "canvg::render", "unresolved {name} {}", property.get_string());
        }
        definition.filter(|marker| marker.kind() == ElementKind::Marker)
    };

    if let Some(marker) = resolve("marker-start") {
        let (point, angle) = markers[0];
        super::marker::render(marker, ctx, point, angle, true);
    }
    if let Some(marker) = resolve("marker-mid") {
        for &(point, angle) in markers.iter().take(last).skip(1) {
            super::marker::render(marker, ctx, point, angle, false);
        }
    }
    if let Some(marker) = resolve("marker-end") {
        let (point, angle) = markers[last];
        super::marker::render(marker, ctx, point, angle, false);
    }
}

fn commands<'d>(element: ElementRef<'d>) -> &'d [PathCommand] {
    match &element.node().data {
        ElementData::Path(commands) => commands,
        ElementData::Glyph(glyph) => &glyph.commands,
        _ => &[],
    }
}

pub(crate) fn path_commands(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let (bbox, _) = trace(commands(element), ctx);
    (!bbox.is_empty()).then_some(bbox)
}

pub(crate) fn markers(element: ElementRef<'_>) -> Vec<Marker> {
    trace(commands(element), None).1
}

/// Walks `commands`, drawing into `ctx` when given, and returns the bounds
/// plus the marker vertices.
pub(crate) fn trace(
    commands: &[PathCommand],
    mut ctx: Option<&mut dyn RenderingContext>,
) -> (BoundingBox, Vec<Marker>) {
    let mut parser = PathParser::new(commands);
    let mut bbox = BoundingBox::empty();
    if let Some(ctx) = ctx.as_deref_mut() {
        ctx.begin_path();
    }

    while !parser.is_end() {
        let Some(command) = parser.next() else {
            break;
        };
        match command {
            PathCommand::MoveTo { .. } => {
                let point = parser.move_to();
                parser.add_marker(point, None, None);
                bbox.add_point(point.x, point.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.move_to(point.x, point.y);
                }
            }
            PathCommand::LineTo { .. }
            | PathCommand::HorizLineTo { .. }
            | PathCommand::VertLineTo { .. } => {
                let (from, to) = match command {
                    PathCommand::LineTo { .. } => parser.line_to(),
                    PathCommand::HorizLineTo { .. } => parser.horiz_line_to(),
                    _ => parser.vert_line_to(),
                };
                parser.add_marker(to, Some(from), None);
                bbox.add_point(to.x, to.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.line_to(to.x, to.y);
                }
            }
            PathCommand::CurveTo { .. } | PathCommand::SmoothCurveTo { .. } => {
                let step = parser.curve_to();
                parser.add_marker(step.end, Some(step.control2), Some(step.control1));
                bbox.add_bezier_curve(
                    step.start.x,
                    step.start.y,
                    step.control1.x,
                    step.control1.y,
                    step.control2.x,
                    step.control2.y,
                    step.end.x,
                    step.end.y,
                );
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.bezier_curve_to(
                        step.control1.x,
                        step.control1.y,
                        step.control2.x,
                        step.control2.y,
                        step.end.x,
                        step.end.y,
                    );
                }
            }
            PathCommand::QuadTo { .. } | PathCommand::SmoothQuadTo { .. } => {
                let step = parser.quad_to();
                parser.add_marker(step.end, Some(step.control), Some(step.control));
                bbox.add_quadratic_curve(
                    step.start.x,
                    step.start.y,
                    step.control.x,
                    step.control.y,
                    step.end.x,
                    step.end.y,
                );
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.quadratic_curve_to(step.control.x, step.control.y, step.end.x, step.end.y);
                }
            }
            PathCommand::Arc { .. } => {
                let step = parser.arc();
                if step.is_line {
                    parser.add_marker(step.end, Some(step.start), None);
                    bbox.add_point(step.end.x, step.end.y);
                    if let Some(ctx) = ctx.as_deref_mut() {
                        ctx.line_to(step.end.x, step.end.y);
                    }
                    continue;
                }

                let delta = sweep_delta(step.delta, step.sweep);
                let direction = if delta < 0.0 { -1.0 } else { 1.0 };
                let halfway_angle = step.start_angle + delta / 2.0;
                let rotation = Matrix::rotation(step.x_axis_rotation);
                let on_ellipse = |angle: f64| {
                    let local = rotation.apply_to_point(Point::new(
                        step.rx * angle.cos(),
                        step.ry * angle.sin(),
                    ));
                    Point::new(step.center.x + local.x, step.center.y + local.y)
                };
                parser.add_marker_angle(
                    on_ellipse(halfway_angle),
                    Some(halfway_angle + direction * PI / 2.0 + step.x_axis_rotation),
                );
                parser.add_marker_angle(
                    step.end,
                    Some(step.start_angle + delta + direction * PI / 2.0 + step.x_axis_rotation),
                );
                bbox.add_point(step.end.x, step.end.y);

                if let Some(ctx) = ctx.as_deref_mut() {
                    if step.start_angle.is_finite() && delta.is_finite() {
                        let (radius, sx, sy) = if step.rx > step.ry {
                            (step.rx, 1.0, step.ry / step.rx)
                        } else {
                            (step.ry, step.rx / step.ry, 1.0)
                        };
                        ctx.translate(step.center.x, step.center.y);
                        ctx.rotate(step.x_axis_rotation);
                        ctx.scale(sx, sy);
                        ctx.arc(
                            0.0,
                            0.0,
                            radius,
                            step.start_angle,
                            step.start_angle + delta,
                            !step.sweep,
                        );
                        ctx.scale(1.0 / sx, 1.0 / sy);
                        ctx.rotate(-step.x_axis_rotation);
                        ctx.translate(-step.center.x, -step.center.y);
                    }
                }
            }
            PathCommand::ClosePath => {
                parser.close_path();
                if let Some(ctx) = ctx.as_deref_mut() {
                    if bbox.x1 != bbox.x2 && bbox.y1 != bbox.y2 {
                        ctx.close_path();
                    }
                }
            }
        }
    }

    let markers = parser
        .marker_points()
        .iter()
        .copied()
        .zip(parser.marker_angles())
        .collect();
    (bbox, markers)
}

/// The signed arc extent: negative when drawn against the sweep direction.
pub(crate) fn sweep_delta(delta: f64, sweep: bool) -> f64 {
    if !sweep && delta > 0.0 {
        delta - TAU
    } else if sweep && delta < 0.0 {
        delta + TAU
    } else {
        delta
    }
}
