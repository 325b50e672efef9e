//! `<textPath>`: glyph-by-glyph placement along a referenced path.

use super::path::sweep_delta;
use super::text::{font_size, measure_target_text};
use super::ElementRef;
use crate::context::{Paint, RenderingContext};
use crate::geometry::{cb1, cb2, cb3, cb4, qb1, qb2, qb3, BoundingBox, Point, PSEUDO_ZERO};
use crate::path_parser::{PathCommand, PathParser};
use crate::property::Axis;
use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;

const LENGTH_EPSILON: f64 = 0.00005;
/// Sampling distance along the path when building the equidistant cache.
const CACHE_PRECISION: f64 = 0.25;

/// One absolute segment of the referenced path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    QuadTo(Point, Point),
    Arc {
        center: Point,
        rx: f64,
        ry: f64,
        start_angle: f64,
        delta: f64,
        rotation: f64,
        sweep: bool,
    },
    ClosePath,
}

#[derive(Debug, Clone, PartialEq)]
struct PathSegment {
    segment: Segment,
    start: Point,
    length: f64,
}

#[derive(Debug, Clone)]
struct EquidistantCache {
    step: f64,
    points: Vec<Point>,
}

#[derive(Debug, Clone)]
struct GlyphPlacement {
    text: String,
    p0: Point,
    p1: Point,
    rotation: f64,
}

/// The flattened path plus lazily built layout caches.
#[derive(Debug, Default)]
pub struct TextPathData {
    segments: Vec<PathSegment>,
    path_length: f64,
    equidistant: RefCell<Option<EquidistantCache>>,
    glyphs: RefCell<Option<Vec<GlyphPlacement>>>,
    measures: RefCell<HashMap<String, f64>>,
}

impl TextPathData {
    /// Converts path commands to absolute segments with their lengths.
    pub fn new(commands: &[PathCommand]) -> Self {
        let mut parser = PathParser::new(commands);
        let mut segments = Vec::new();
        while !parser.is_end() {
            let start = parser.current;
            let Some(command) = parser.next() else {
                break;
            };
            let segment = match command {
                PathCommand::MoveTo { .. } => Segment::MoveTo(parser.move_to()),
                PathCommand::LineTo { .. } => Segment::LineTo(parser.line_to().1),
                PathCommand::HorizLineTo { .. } => Segment::LineTo(parser.horiz_line_to().1),
                PathCommand::VertLineTo { .. } => Segment::LineTo(parser.vert_line_to().1),
                PathCommand::CurveTo { .. } | PathCommand::SmoothCurveTo { .. } => {
                    let step = parser.curve_to();
                    Segment::CurveTo(step.control1, step.control2, step.end)
                }
                PathCommand::QuadTo { .. } | PathCommand::SmoothQuadTo { .. } => {
                    let step = parser.quad_to();
                    Segment::QuadTo(step.control, step.end)
                }
                PathCommand::Arc { .. } => {
                    let step = parser.arc();
                    if step.is_line {
                        Segment::LineTo(step.end)
                    } else {
                        Segment::Arc {
                            center: step.center,
                            rx: step.rx,
                            ry: step.ry,
                            start_angle: step.start_angle,
                            delta: sweep_delta(step.delta, step.sweep),
                            rotation: step.x_axis_rotation,
                            sweep: step.sweep,
                        }
                    }
                }
                PathCommand::ClosePath => {
                    parser.close_path();
                    Segment::ClosePath
                }
            };
            let length = segment_length(start, &segment);
            segments.push(PathSegment {
                segment,
                start,
                length,
            });
        }
        let path_length = segments
            .iter()
            .filter(|segment| segment.length > 0.0)
            .map(|segment| segment.length)
            .sum();
        Self {
            segments,
            path_length,
            ..Default::default()
        }
    }

    pub fn path_length(&self) -> f64 {
        self.path_length
    }

    /// The point `distance` along the path, or `None` past either end.
    pub fn point_on_path(&self, distance: f64) -> Option<Point> {
        if distance < -LENGTH_EPSILON || distance - LENGTH_EPSILON > self.path_length {
            return None;
        }
        let mut cumulative = 0.0;
        for segment in &self.segments {
            if segment.length < LENGTH_EPSILON
                || cumulative + segment.length + LENGTH_EPSILON < distance
            {
                cumulative += segment.length;
                continue;
            }
            let delta = distance - cumulative;
            let start = segment.start;
            return match segment.segment {
                Segment::LineTo(end) => point_on_line(delta, start, end, start),
                Segment::Arc {
                    center,
                    rx,
                    ry,
                    start_angle,
                    delta: sweep,
                    rotation,
                    ..
                } => {
                    let end_angle = start_angle + sweep;
                    let t = start_angle + delta / segment.length * sweep;
                    if (sweep < 0.0 && t < end_angle) || (sweep >= 0.0 && t > end_angle) {
                        None
                    } else {
                        Some(point_on_elliptical_arc(center, rx, ry, t, rotation))
                    }
                }
                Segment::CurveTo(c1, c2, end) => {
                    Some(point_on_cubic((delta / segment.length).min(1.0), start, c1, c2, end))
                }
                Segment::QuadTo(control, end) => {
                    Some(point_on_quadratic((delta / segment.length).min(1.0), start, control, end))
                }
                Segment::MoveTo(_) | Segment::ClosePath => None,
            };
        }
        None
    }

    fn build_equidistant_cache(&self, step: f64) {
        let mut cache = self.equidistant.borrow_mut();
        if cache.as_ref().is_some_and(|cache| cache.step == step) {
            return;
        }
        let mut points = Vec::new();
        let mut travelled = 0.0;
        let mut l = 0.0;
        while l <= self.path_length {
            if let (Some(p0), Some(p1)) = (
                self.point_on_path(l),
                self.point_on_path(l + CACHE_PRECISION),
            ) {
                travelled += p0.distance_to(&p1);
                if travelled >= step {
                    points.push(p0);
                    travelled -= step;
                }
            }
            l += CACHE_PRECISION;
        }
        *cache = Some(EquidistantCache { step, points });
    }

    /// A cached point close to `distance` along the path.
    pub fn equidistant_point(&self, distance: f64, step: f64) -> Option<Point> {
        let step = if step > 0.0 { step } else { self.path_length / 100.0 };
        self.build_equidistant_cache(step);
        if distance < 0.0 || distance - self.path_length > LENGTH_EPSILON {
            return None;
        }
        let cache = self.equidistant.borrow();
        let points = &cache.as_ref()?.points;
        if points.is_empty() {
            return None;
        }
        let index = (distance / self.path_length * (points.len() - 1) as f64).round() as usize;
        points.get(index).copied()
    }
}

fn segment_length(start: Point, segment: &Segment) -> f64 {
    match *segment {
        Segment::LineTo(end) => start.distance_to(&end),
        Segment::CurveTo(c1, c2, end) => {
            sampled_length(|t| point_on_cubic(t, start, c1, c2, end))
        }
        Segment::QuadTo(control, end) => {
            sampled_length(|t| point_on_quadratic(t, start, control, end))
        }
        Segment::Arc {
            center,
            rx,
            ry,
            start_angle,
            delta,
            ..
        } => {
            let end_angle = start_angle + delta;
            let mut increment = PI / 180.0;
            if (start_angle - end_angle).abs() < increment {
                increment = (start_angle - end_angle).abs();
            }
            let mut length = 0.0;
            let mut previous = point_on_elliptical_arc(center, rx, ry, start_angle, 0.0);
            if increment > 0.0 {
                let mut t = if delta < 0.0 {
                    start_angle - increment
                } else {
                    start_angle + increment
                };
                while (delta < 0.0 && t > end_angle) || (delta >= 0.0 && t < end_angle) {
                    let next = point_on_elliptical_arc(center, rx, ry, t, 0.0);
                    length += previous.distance_to(&next);
                    previous = next;
                    t += if delta < 0.0 { -increment } else { increment };
                }
            }
            let last = point_on_elliptical_arc(center, rx, ry, end_angle, 0.0);
            length + previous.distance_to(&last)
        }
        Segment::MoveTo(_) | Segment::ClosePath => 0.0,
    }
}

fn sampled_length(point_at: impl Fn(f64) -> Point) -> f64 {
    let mut length = 0.0;
    let mut previous = point_at(0.0);
    for i in 1..=100 {
        let next = point_at(f64::from(i) / 100.0);
        length += previous.distance_to(&next);
        previous = next;
    }
    length
}

fn point_on_cubic(t: f64, p1: Point, p2: Point, p3: Point, p4: Point) -> Point {
    Point::new(
        p4.x * cb1(t) + p3.x * cb2(t) + p2.x * cb3(t) + p1.x * cb4(t),
        p4.y * cb1(t) + p3.y * cb2(t) + p2.y * cb3(t) + p1.y * cb4(t),
    )
}

fn point_on_quadratic(t: f64, p1: Point, p2: Point, p3: Point) -> Point {
    Point::new(
        p3.x * qb1(t) + p2.x * qb2(t) + p1.x * qb3(t),
        p3.y * qb1(t) + p2.y * qb2(t) + p1.y * qb3(t),
    )
}

fn point_on_elliptical_arc(center: Point, rx: f64, ry: f64, theta: f64, psi: f64) -> Point {
    let (sin_psi, cos_psi) = psi.sin_cos();
    let (x, y) = (rx * theta.cos(), ry * theta.sin());
    Point::new(
        center.x + (x * cos_psi - y * sin_psi),
        center.y + (x * sin_psi + y * cos_psi),
    )
}

/// The point `distance` from `from` along the line through `p1` and `p2`.
fn point_on_line(distance: f64, p1: Point, p2: Point, from: Point) -> Option<Point> {
    let m = (p2.y - p1.y) / (p2.x - p1.x + PSEUDO_ZERO);
    let mut run = (distance * distance / (1.0 + m * m)).sqrt();
    if p2.x < p1.x {
        run = -run;
    }
    let mut rise = m * run;

    if p2.x == p1.x {
        return Some(Point::new(from.x, from.y + rise));
    }
    if (from.y - p1.y) / (from.x - p1.x + PSEUDO_ZERO) == m {
        return Some(Point::new(from.x + run, from.y + rise));
    }

    let length = p1.distance_to(&p2);
    if length < PSEUDO_ZERO {
        return None;
    }
    let u = ((from.x - p1.x) * (p2.x - p1.x) + (from.y - p1.y) * (p2.y - p1.y)) / (length * length);
    let ix = p1.x + u * (p2.x - p1.x);
    let iy = p1.y + u * (p2.y - p1.y);
    let p_rise = from.distance_to(&Point::new(ix, iy));
    let p_run = (distance * distance - p_rise * p_rise).sqrt();
    run = (p_run * p_run / (1.0 + m * m)).sqrt();
    if p2.x < p1.x {
        run = -run;
    }
    rise = m * run;
    Some(Point::new(ix + run, iy + rise))
}

fn data<'d>(element: ElementRef<'d>) -> Option<&'d TextPathData> {
    match &element.node().data {
        super::ElementData::TextPath(data) => Some(data),
        _ => None,
    }
}

/// Traces the referenced path; text paths clip like their path.
pub(crate) fn path(
    element: ElementRef<'_>,
    mut ctx: Option<&mut dyn RenderingContext>,
) -> Option<BoundingBox> {
    let data = data(element)?;
    let mut bbox = BoundingBox::empty();
    if let Some(ctx) = ctx.as_deref_mut() {
        ctx.begin_path();
    }
    for segment in &data.segments {
        match segment.segment {
            Segment::MoveTo(point) => {
                bbox.add_point(point.x, point.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.move_to(point.x, point.y);
                }
            }
            Segment::LineTo(point) => {
                bbox.add_point(point.x, point.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.line_to(point.x, point.y);
                }
            }
            Segment::CurveTo(c1, c2, end) => {
                let start = segment.start;
                bbox.add_bezier_curve(start.x, start.y, c1.x, c1.y, c2.x, c2.y, end.x, end.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
                }
            }
            Segment::QuadTo(control, end) => {
                let start = segment.start;
                bbox.add_quadratic_curve(start.x, start.y, control.x, control.y, end.x, end.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.quadratic_curve_to(control.x, control.y, end.x, end.y);
                }
            }
            Segment::Arc {
                center,
                rx,
                ry,
                start_angle,
                delta,
                rotation,
                sweep,
            } => {
                let end = point_on_elliptical_arc(center, rx, ry, start_angle + delta, rotation);
                bbox.add_point(end.x, end.y);
                if let Some(ctx) = ctx.as_deref_mut() {
                    let (radius, sx, sy) = if rx > ry {
                        (rx, 1.0, ry / rx)
                    } else {
                        (ry, rx / ry, 1.0)
                    };
                    ctx.translate(center.x, center.y);
                    ctx.rotate(rotation);
                    ctx.scale(sx, sy);
                    ctx.arc(0.0, 0.0, radius, start_angle, start_angle + delta, !sweep);
                    ctx.scale(1.0 / sx, 1.0 / sy);
                    ctx.rotate(-rotation);
                    ctx.translate(-center.x, -center.y);
                }
            }
            Segment::ClosePath => {
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.close_path();
                }
            }
        }
    }
    (!bbox.is_empty()).then_some(bbox)
}

fn measure(element: ElementRef<'_>, data: &TextPathData, ctx: &mut dyn RenderingContext, text: &str) -> f64 {
    if let Some(measure) = data.measures.borrow().get(text) {
        return *measure;
    }
    let measure = measure_target_text(element, ctx, text);
    data.measures.borrow_mut().insert(text.to_string(), measure);
    measure
}

fn letter_spacing(element: ElementRef<'_>) -> f64 {
    let own = element.get_style("letter-spacing");
    let parent_spacing = || {
        element
            .parent()
            .map(|parent| parent.get_style("letter-spacing").get_pixels(Axis::Diagonal))
            .unwrap_or(0.0)
    };
    if !own.has_value() || own.get_string() == "inherit" {
        return parent_spacing();
    }
    match own.get_string().as_str() {
        "initial" | "unset" => 0.0,
        _ => own.get_pixels(Axis::Diagonal),
    }
}

/// Lays out one placement per character, cached after the first render.
fn layout_glyphs(element: ElementRef<'_>, data: &TextPathData, ctx: &mut dyn RenderingContext) {
    if data.glyphs.borrow().is_some() {
        return;
    }
    let parent = element.parent();
    let parent_attribute = |name: &str| parent.map(|parent| parent.get_attribute(name));
    let text = element.text().to_string();
    let chars: Vec<char> = text.chars().collect();
    let spaces = chars.iter().filter(|c| **c == ' ').count();
    let dx: Vec<f64> = parent_attribute("dx")
        .map(|dx| dx.split().iter().map(|dx| dx.get_pixels(Axis::X)).collect())
        .unwrap_or_default();
    let dy = parent_attribute("dy")
        .map(|dy| dy.get_pixels(Axis::Y))
        .unwrap_or(0.0);
    let anchor = parent
        .map(|parent| parent.get_style("text-anchor").get_string_or("start"))
        .unwrap_or_else(|| "start".to_string());

    let default_spacing = letter_spacing(element);
    let spacing: Vec<f64> = (0..chars.len())
        .map(|i| dx.get(i).copied().unwrap_or(default_spacing))
        .collect();
    let dx_sum: f64 = spacing.iter().skip(1).sum();
    let text_width = measure(element, data, ctx, &text);
    let text_full_width = (text_width + dx_sum).max(0.0);
    let text_height = font_size(element, ctx);
    let full_path_width = data.path_length();

    let start_offset = element.get_style("startOffset");
    let start_offset = if start_offset.get_string().trim_end().ends_with('%') {
        start_offset.get_number() * full_path_width
    } else {
        start_offset.get_pixels(Axis::X)
    };
    let mut offset = match anchor.as_str() {
        "middle" | "center" => -text_full_width / 2.0,
        "end" | "right" => -text_full_width,
        _ => 0.0,
    } + start_offset;

    let spline_step = text_height / 20.0;
    let mut glyphs = Vec::new();
    for (i, c) in chars.iter().enumerate() {
        let glyph = c.to_string();
        let mut glyph_width = measure(element, data, ctx, &glyph);
        if *c == ' ' && anchor == "justify" && text_full_width < full_path_width && spaces > 0 {
            glyph_width += (full_path_width - text_full_width) / spaces as f64;
        }
        offset += spacing[i];
        let p0 = data.equidistant_point(offset, spline_step);
        let p1 = data.equidistant_point(offset + glyph_width, spline_step);
        offset += glyph_width;
        let (Some(mut p0), Some(mut p1)) = (p0, p1) else {
            continue;
        };
        let rotation = (p1.y - p0.y).atan2(p1.x - p0.x);
        if dy != 0.0 {
            let dy_x = (PI / 2.0 + rotation).cos() * dy;
            let dy_y = (-rotation).cos() * dy;
            p0 = Point::new(p0.x + dy_x, p0.y + dy_y);
            p1 = Point::new(p1.x + dy_x, p1.y + dy_y);
        }
        glyphs.push(GlyphPlacement {
            text: glyph,
            p0,
            p1,
            rotation,
        });
    }
    *data.glyphs.borrow_mut() = Some(glyphs);
}

pub(crate) fn render_children(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let Some(data) = data(element) else {
        return;
    };
    layout_glyphs(element, data, ctx);

    ctx.save();
    let underline = element
        .parent()
        .is_some_and(|parent| parent.get_style("text-decoration").get_string() == "underline");
    let font_size = font_size(element, ctx);
    let fill: Paint = ctx.fill_style();
    if underline {
        ctx.begin_path();
    }
    let glyphs = data.glyphs.borrow();
    for (i, glyph) in glyphs.iter().flatten().enumerate() {
        ctx.save();
        ctx.translate(glyph.p0.x, glyph.p0.y);
        ctx.rotate(glyph.rotation);
        if !ctx.fill_style().is_invisible() {
            ctx.fill_text(&glyph.text, 0.0, 0.0);
        }
        if !ctx.stroke_style().is_invisible() {
            ctx.stroke_text(&glyph.text, 0.0, 0.0);
        }
        ctx.restore();
        if underline {
            if i == 0 {
                ctx.move_to(glyph.p0.x, glyph.p0.y + font_size / 8.0);
            }
            ctx.line_to(glyph.p1.x, glyph.p1.y + font_size / 5.0);
        }
    }
    if underline {
        ctx.set_line_width(font_size / 20.0);
        ctx.set_stroke_style(fill);
        ctx.stroke();
        ctx.close_path();
    }
    ctx.restore();
}
