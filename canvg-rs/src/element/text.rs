//! `<text>` layout: chunked anchoring, positional attributes, SVG fonts and
//! the leaf renderers for `<tspan>`, `<tref>`, `<a>` and text nodes.

use super::svg_font::{font_data, FontData};
use super::{ElementKind, ElementRef};
use crate::context::RenderingContext;
use crate::font::Font;
use crate::geometry::{BoundingBox, Point};
use crate::property::{Axis, Property, Value};
use crate::util::to_numbers;

/// Running state while laying out the leaves of one `<text>`.
struct Layout<'d> {
    cursor: Point,
    leaves: Vec<ElementRef<'d>>,
    chunk_start: usize,
    min_x: f64,
    max_x: f64,
}

impl<'d> Layout<'d> {
    fn new() -> Self {
        Self {
            cursor: Point::default(),
            leaves: Vec::new(),
            chunk_start: 0,
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
        }
    }

    /// Shifts the current chunk by its first leaf's `text-anchor` and starts
    /// a new chunk.
    fn apply_anchoring(&mut self) {
        let Some(first) = self.leaves.get(self.chunk_start).copied() else {
            return;
        };
        let anchor = first.get_style("text-anchor").get_string_or("start");
        let first_x = first.node().position.get().x;
        let shift = match anchor.as_str() {
            "start" => first_x - self.min_x,
            "end" => first_x - self.max_x,
            _ => first_x - (self.min_x + self.max_x) / 2.0,
        };
        for leaf in &self.leaves[self.chunk_start..] {
            let mut position = leaf.node().position.get();
            position.x += shift;
            leaf.node().position.set(position);
        }
        self.min_x = f64::INFINITY;
        self.max_x = f64::NEG_INFINITY;
        self.chunk_start = self.leaves.len();
    }

    fn adjust_recursive(&mut self, ctx: &mut dyn RenderingContext, parent: ElementRef<'d>) {
        for (index, child) in parent.children().enumerate() {
            if child.child_count() > 0 {
                self.adjust_recursive(ctx, child);
            } else {
                self.adjust_leaf(ctx, child, index);
            }
        }
    }

    fn adjust_leaf(&mut self, ctx: &mut dyn RenderingContext, child: ElementRef<'d>, index: usize) {
        if !child.kind().is_text() {
            return;
        }
        ctx.save();
        child.set_context(ctx, true);

        let mut x = child.get_attribute("x");
        let mut y = child.get_attribute("y");
        let mut dx = child.get_attribute("dx");
        let mut dy = child.get_attribute("dy");
        if index == 0 {
            // Positional attributes pass from a parent to its first child only.
            for attribute in [&mut x, &mut y, &mut dx, &mut dy] {
                if !attribute.has_value() {
                    let name = attribute.name().to_string();
                    attribute.set_value(inherited_attribute(child, &name));
                }
            }
        }
        let is_rtl = custom_font(child).is_some_and(|(_, font)| font.is_rtl);
        let width = measure_leaf(child, ctx);
        if is_rtl {
            self.cursor.x -= width;
        }

        let mut position = Point::default();
        if x.has_value() {
            self.apply_anchoring();
            position.x = x.get_pixels(Axis::X);
            if dx.has_value() {
                position.x += dx.get_pixels(Axis::X);
            }
        } else {
            if dx.has_value() {
                self.cursor.x += dx.get_pixels(Axis::X);
            }
            position.x = self.cursor.x;
        }
        self.cursor.x = position.x;
        if !is_rtl {
            self.cursor.x += width;
        }

        if y.has_value() {
            position.y = y.get_pixels(Axis::Y);
            if dy.has_value() {
                position.y += dy.get_pixels(Axis::Y);
            }
        } else {
            if dy.has_value() {
                self.cursor.y += dy.get_pixels(Axis::Y);
            }
            position.y = self.cursor.y;
        }
        self.cursor.y = position.y;
        child.node().position.set(position);

        self.leaves.push(child);
        self.min_x = self.min_x.min(position.x).min(position.x + width);
        self.max_x = self.max_x.max(position.x).max(position.x + width);

        child.clear_context(ctx);
        ctx.restore();
    }
}

/// Walks up through first children looking for a positional attribute.
fn inherited_attribute(element: ElementRef<'_>, name: &str) -> Value {
    let mut current = element;
    while current.kind().is_text() && current.is_first_child() {
        let Some(parent) = current.parent() else {
            break;
        };
        let attribute = parent.get_attribute(name);
        if attribute.has_value_with(true) {
            return Value::Text(attribute.get_value_or("0"));
        }
        current = parent;
    }
    Value::Empty
}

fn layout(text: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let mut layout = Layout::new();
    layout.adjust_recursive(ctx, text);
    layout.apply_anchoring();
}

pub(crate) fn set_context(element: ElementRef<'_>, ctx: &mut dyn RenderingContext, from_measure: bool) {
    super::rendered::set_context(element, ctx, from_measure);
    let baseline = element
        .get_style("dominant-baseline")
        .get_text_baseline()
        .or_else(|| element.get_style("alignment-baseline").get_text_baseline());
    if let Some(baseline) = baseline {
        ctx.set_text_baseline(baseline);
    }
}

pub(crate) fn render_text_children(text: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    layout(text, ctx);
    for child in text.children() {
        render_child(child, ctx);
    }
    let document = text.document();
    if document.screen.is_mouse_working() {
        let bbox = text_bounding_box(text, ctx);
        document.screen.check_bounding_box(text, bbox.as_ref());
    }
}

fn render_child(child: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    child.render(ctx);
    for grandchild in child.children() {
        render_child(grandchild, ctx);
    }
}

pub(crate) fn text_bounding_box(text: ElementRef<'_>, ctx: &mut dyn RenderingContext) -> Option<BoundingBox> {
    layout(text, ctx);
    let mut bbox: Option<BoundingBox> = None;
    for child in text.children() {
        let child_bbox = child_bounding_box(child, ctx);
        bbox = match bbox {
            Some(mut bbox) => {
                bbox.add_bounding_box(child_bbox.as_ref());
                Some(bbox)
            }
            None => child_bbox,
        };
    }
    bbox
}

fn child_bounding_box(child: ElementRef<'_>, ctx: &mut dyn RenderingContext) -> Option<BoundingBox> {
    let mut bbox = child.get_bounding_box(ctx)?;
    for grandchild in child.children() {
        bbox.add_bounding_box(child_bounding_box(grandchild, ctx).as_ref());
    }
    Some(bbox)
}

/// The box from the baseline up one font size, as wide as the leaf text.
pub(crate) fn leaf_bounding_box(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) -> BoundingBox {
    let position = element.node().position.get();
    let font_size = font_size(element, ctx);
    BoundingBox::new(
        position.x,
        position.y - font_size,
        position.x + measure_leaf(element, ctx),
        position.y,
    )
}

/// The element's font size as a number, defaulting to the surface font.
pub(crate) fn font_size(element: ElementRef<'_>, ctx: &dyn RenderingContext) -> f64 {
    let inherited = Font::parse(&ctx.font(), None).size_px().unwrap_or(0.0);
    element.get_style("font-size").get_number_or(inherited)
}

/// The text a leaf draws.
pub(crate) fn leaf_text(element: ElementRef<'_>) -> String {
    match element.kind() {
        ElementKind::TRef => {
            let Some(target) = element.get_href_attribute().get_definition() else {
                return String::new();
            };
            match target.first_child() {
                Some(first) => first.text().to_string(),
                None => target.text().to_string(),
            }
        }
        ElementKind::Text => String::new(),
        _ if element.child_count() > 0 => String::new(),
        _ => element.text().to_string(),
    }
}

/// The SVG font named by `font-family`, if any.
pub(crate) fn custom_font<'d>(element: ElementRef<'d>) -> Option<(ElementRef<'d>, &'d FontData)> {
    let family = element.get_style("font-family");
    if !family.has_value() {
        return None;
    }
    let font = family.get_definition()?;
    font_data(font).map(|data| (font, data))
}

fn measure_leaf(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) -> f64 {
    let cache = &element.node().measure_cache;
    if let Some(measure) = cache.get() {
        return measure;
    }
    let measure = measure_target_text(element, ctx, &leaf_text(element));
    cache.set(Some(measure));
    measure
}

/// Advance width of `text` in `element`'s font.
pub(crate) fn measure_target_text(element: ElementRef<'_>, ctx: &mut dyn RenderingContext, text: &str) -> f64 {
    if let Some((font, data)) = custom_font(element) {
        let size = font_size(element, ctx);
        let chars = ordered_chars(text, data);
        let dx = to_numbers(&element.get_attribute("dx").get_string());
        let document = font.document();
        return (0..chars.len())
            .map(|index| {
                let advance = data
                    .glyph_for(&chars, index)
                    .map(|id| data.advance(ElementRef::new(document, id)))
                    .unwrap_or(data.horiz_adv_x);
                advance * size / data.units_per_em + dx.get(index).copied().unwrap_or(0.0)
            })
            .sum();
    }
    ctx.save();
    element.set_context(ctx, true);
    let measure = ctx.measure_text(text);
    element.clear_context(ctx);
    ctx.restore();
    measure
}

fn ordered_chars(text: &str, font: &FontData) -> Vec<char> {
    if font.is_rtl {
        text.chars().rev().collect()
    } else {
        text.chars().collect()
    }
}

/// Draws a leaf's text at its laid-out position.
pub(crate) fn render_leaf(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let text = leaf_text(element);
    if text.is_empty() {
        return;
    }
    if let Some((font, data)) = custom_font(element) {
        render_glyphs(element, ctx, font, data, &text);
        return;
    }
    let position = element.node().position.get();
    if !ctx.fill_style().is_invisible() {
        ctx.fill_text(&text, position.x, position.y);
    }
    if !ctx.stroke_style().is_invisible() {
        ctx.stroke_text(&text, position.x, position.y);
    }
}

fn render_glyphs(
    element: ElementRef<'_>,
    ctx: &mut dyn RenderingContext,
    font: ElementRef<'_>,
    data: &FontData,
    text: &str,
) {
    let surface_font = Font::parse(&ctx.font(), None);
    let size = element
        .get_style("font-size")
        .get_number_or(surface_font.size_px().unwrap_or(0.0));
    if size == 0.0 {
        return;
    }
    let style = element
        .get_style("font-style")
        .get_string_or(&surface_font.font_style);
    let scale = size / data.units_per_em;
    let chars = ordered_chars(text, data);
    let dx = to_numbers(&element.get_attribute("dx").get_string());
    let document = font.document();

    let mut position = element.node().position.get();
    for index in 0..chars.len() {
        let Some(glyph) = data.glyph_for(&chars, index) else {
            continue;
        };
        let glyph = ElementRef::new(document, glyph);
        ctx.translate(position.x, position.y);
        ctx.scale(scale, -scale);
        let line_width = ctx.line_width();
        ctx.set_line_width(line_width * data.units_per_em / size);
        if style == "italic" {
            ctx.transform(1.0, 0.0, 0.4, 1.0, 0.0, 0.0);
        }
        glyph.render(ctx);
        if style == "italic" {
            ctx.transform(1.0, 0.0, -0.4, 1.0, 0.0, 0.0);
        }
        ctx.set_line_width(line_width);
        ctx.scale(1.0 / scale, -1.0 / scale);
        ctx.translate(-position.x, -position.y);

        position.x += size * data.advance(glyph) / data.units_per_em;
        if let Some(offset) = dx.get(index) {
            position.x += offset;
        }
    }
    element.node().position.set(position);
}

/// `<a>`: a text leaf when it only holds text, else a plain group. Inside
/// `<text>` its children are drawn by the enclosing layout.
pub(crate) fn render_anchor(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    if element.child_count() == 0 {
        render_leaf(element, ctx);
        let document = element.document();
        if document.screen.is_mouse_working() {
            let position = element.node().position.get();
            let font_size = Property::new(
                document,
                "fontSize",
                Font::parse(&ctx.font(), None).font_size,
            )
            .get_pixels(Axis::Y);
            let bbox = BoundingBox::new(
                position.x,
                position.y - font_size,
                position.x + measure_leaf(element, ctx),
                position.y,
            );
            document.screen.check_bounding_box(element, Some(&bbox));
        }
        return;
    }
    if element
        .ancestors()
        .any(|ancestor| ancestor.kind() == ElementKind::Text)
    {
        return;
    }
    element.render_each_child(ctx);
}
