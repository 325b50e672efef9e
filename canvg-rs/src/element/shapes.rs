//! Basic shapes: rect, circle, ellipse, line, polyline and polygon.

use super::{ElementData, ElementRef, Marker};
use crate::context::RenderingContext;
use crate::geometry::{BoundingBox, Point};
use crate::property::Axis;
use std::f64::consts::{SQRT_2, TAU};

/// Control-point distance for a quarter circle of radius 1.
const KAPPA: f64 = 4.0 * ((SQRT_2 - 1.0) / 3.0);

pub(crate) fn rect_path(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let x = element.get_attribute("x").get_pixels(Axis::X);
    let y = element.get_attribute("y").get_pixels(Axis::Y);
    let width = element.get_own_style("width").get_pixels(Axis::X);
    let height = element.get_own_style("height").get_pixels(Axis::Y);
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let rx_attr = element.get_attribute("rx");
    let ry_attr = element.get_attribute("ry");
    let mut rx = rx_attr.get_pixels(Axis::X);
    let mut ry = ry_attr.get_pixels(Axis::Y);
    if rx_attr.has_value() && !ry_attr.has_value() {
        ry = rx;
    }
    if ry_attr.has_value() && !rx_attr.has_value() {
        rx = ry;
    }
    let rx = rx.clamp(0.0, width / 2.0);
    let ry = ry.clamp(0.0, height / 2.0);

    if let Some(ctx) = ctx {
        let (right, bottom) = (x + width, y + height);
        ctx.begin_path();
        ctx.move_to(x + rx, y);
        ctx.line_to(right - rx, y);
        ctx.bezier_curve_to(right - rx + KAPPA * rx, y, right, y + ry - KAPPA * ry, right, y + ry);
        ctx.line_to(right, bottom - ry);
        ctx.bezier_curve_to(
            right,
            bottom - ry + KAPPA * ry,
            right - rx + KAPPA * rx,
            bottom,
            right - rx,
            bottom,
        );
        ctx.line_to(x + rx, bottom);
        ctx.bezier_curve_to(x + rx - KAPPA * rx, bottom, x, bottom - ry + KAPPA * ry, x, bottom - ry);
        ctx.line_to(x, y + ry);
        ctx.bezier_curve_to(x, y + ry - KAPPA * ry, x + rx - KAPPA * rx, y, x + rx, y);
        ctx.close_path();
    }

    Some(BoundingBox::new(x, y, x + width, y + height))
}

pub(crate) fn circle_path(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let cx = element.get_attribute("cx").get_pixels(Axis::X);
    let cy = element.get_attribute("cy").get_pixels(Axis::Y);
    let r = element.get_attribute("r").get_pixels(Axis::Diagonal);
    if r <= 0.0 {
        return None;
    }
    if let Some(ctx) = ctx {
        ctx.begin_path();
        ctx.arc(cx, cy, r, 0.0, TAU, false);
        ctx.close_path();
    }
    Some(BoundingBox::new(cx - r, cy - r, cx + r, cy + r))
}

pub(crate) fn ellipse_path(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let rx = element.get_attribute("rx").get_pixels(Axis::X);
    let ry = element.get_attribute("ry").get_pixels(Axis::Y);
    let cx = element.get_attribute("cx").get_pixels(Axis::X);
    let cy = element.get_attribute("cy").get_pixels(Axis::Y);
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    if let Some(ctx) = ctx {
        ctx.begin_path();
        ctx.move_to(cx + rx, cy);
        ctx.bezier_curve_to(cx + rx, cy + KAPPA * ry, cx + KAPPA * rx, cy + ry, cx, cy + ry);
        ctx.bezier_curve_to(cx - KAPPA * rx, cy + ry, cx - rx, cy + KAPPA * ry, cx - rx, cy);
        ctx.bezier_curve_to(cx - rx, cy - KAPPA * ry, cx - KAPPA * rx, cy - ry, cx, cy - ry);
        ctx.bezier_curve_to(cx + KAPPA * rx, cy - ry, cx + rx, cy - KAPPA * ry, cx + rx, cy);
        ctx.close_path();
    }
    Some(BoundingBox::new(cx - rx, cy - ry, cx + rx, cy + ry))
}

fn line_points(element: ElementRef<'_>) -> (Point, Point) {
    (
        Point::new(
            element.get_attribute("x1").get_pixels(Axis::X),
            element.get_attribute("y1").get_pixels(Axis::Y),
        ),
        Point::new(
            element.get_attribute("x2").get_pixels(Axis::X),
            element.get_attribute("y2").get_pixels(Axis::Y),
        ),
    )
}

pub(crate) fn line_path(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let (start, end) = line_points(element);
    if let Some(ctx) = ctx {
        ctx.begin_path();
        ctx.move_to(start.x, start.y);
        ctx.line_to(end.x, end.y);
    }
    Some(BoundingBox::new(start.x, start.y, end.x, end.y))
}

/// Both ends carry the line's direction.
pub(crate) fn line_markers(element: ElementRef<'_>) -> Vec<Marker> {
    let (start, end) = line_points(element);
    let angle = start.angle_to(&end);
    vec![(start, Some(angle)), (end, Some(angle))]
}

fn points<'d>(element: ElementRef<'d>) -> &'d [Point] {
    match &element.node().data {
        ElementData::Points(points) => points,
        _ => &[],
    }
}

pub(crate) fn polyline_path(
    element: ElementRef<'_>,
    ctx: Option<&mut dyn RenderingContext>,
    closed: bool,
) -> Option<BoundingBox> {
    let points = points(element);
    let first = *points.first()?;
    let mut bbox = BoundingBox::empty();
    match ctx {
        Some(ctx) => {
            ctx.begin_path();
            ctx.move_to(first.x, first.y);
            for point in points {
                bbox.add_point(point.x, point.y);
                ctx.line_to(point.x, point.y);
            }
            if closed {
                ctx.line_to(first.x, first.y);
                ctx.close_path();
            }
        }
        None => {
            for point in points {
                bbox.add_point(point.x, point.y);
            }
        }
    }
    Some(bbox)
}

/// Each vertex points at the next one; the last repeats the previous angle.
pub(crate) fn polyline_markers(element: ElementRef<'_>) -> Vec<Marker> {
    let points = points(element);
    let mut markers: Vec<Marker> = points
        .windows(2)
        .map(|pair| (pair[0], Some(pair[0].angle_to(&pair[1]))))
        .collect();
    if let (Some(&(_, angle)), Some(&last)) = (markers.last(), points.last()) {
        markers.push((last, angle));
    }
    markers
}
