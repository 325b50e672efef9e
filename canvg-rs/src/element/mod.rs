//! The typed element graph built from SVG markup.
//!
//! Elements live in an arena owned by the [`Document`] and are addressed by
//! [`NodeId`]. An [`ElementRef`] pairs an id with its document and carries all
//! element behaviour; per-kind logic lives in the submodules and is selected
//! by matching on [`ElementKind`].

pub(crate) mod animate;
pub(crate) mod effects;
pub(crate) mod image;
pub(crate) mod marker;
pub(crate) mod paint;
pub(crate) mod path;
pub(crate) mod rendered;
pub(crate) mod shapes;
pub(crate) mod structure;
pub(crate) mod svg_font;
pub(crate) mod text;
pub(crate) mod text_path;

use crate::context::RenderingContext;
use crate::document::Document;
use crate::geometry::{BoundingBox, Point};
use crate::path_parser::PathCommand;
use crate::property::{Property, Slot, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Index of an element in its document's arena.
pub type NodeId = usize;

/// A marker vertex: position plus tangent angle in radians, when known.
pub type Marker = (Point, Option<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Unknown,
    Svg,
    G,
    Defs,
    Use,
    Symbol,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Path,
    Text,
    TSpan,
    TRef,
    A,
    TextPath,
    TextNode,
    Image,
    Pattern,
    Marker,
    LinearGradient,
    RadialGradient,
    Stop,
    Mask,
    ClipPath,
    Filter,
    FeColorMatrix,
    FeGaussianBlur,
    FeDropShadow,
    FeMorphology,
    FeComposite,
    Font,
    FontFace,
    MissingGlyph,
    Glyph,
    Style,
    Title,
    Desc,
    Animate,
    AnimateColor,
    AnimateTransform,
}

impl ElementKind {
    /// Maps a tag name to its kind. Unrecognized tags render their children.
    pub fn from_tag(tag: &str) -> ElementKind {
        match tag {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::G,
            "defs" => ElementKind::Defs,
            "use" => ElementKind::Use,
            "symbol" => ElementKind::Symbol,
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "path" => ElementKind::Path,
            "text" => ElementKind::Text,
            "tspan" => ElementKind::TSpan,
            "tref" => ElementKind::TRef,
            "a" => ElementKind::A,
            "textPath" => ElementKind::TextPath,
            "image" => ElementKind::Image,
            "pattern" => ElementKind::Pattern,
            "marker" => ElementKind::Marker,
            "linearGradient" => ElementKind::LinearGradient,
            "radialGradient" => ElementKind::RadialGradient,
            "stop" => ElementKind::Stop,
            "mask" => ElementKind::Mask,
            "clipPath" => ElementKind::ClipPath,
            "filter" => ElementKind::Filter,
            "feColorMatrix" => ElementKind::FeColorMatrix,
            "feGaussianBlur" => ElementKind::FeGaussianBlur,
            "feDropShadow" => ElementKind::FeDropShadow,
            "feMorphology" => ElementKind::FeMorphology,
            "feComposite" => ElementKind::FeComposite,
            "font" => ElementKind::Font,
            "font-face" => ElementKind::FontFace,
            "missing-glyph" => ElementKind::MissingGlyph,
            "glyph" => ElementKind::Glyph,
            "style" => ElementKind::Style,
            "title" => ElementKind::Title,
            "desc" => ElementKind::Desc,
            "animate" => ElementKind::Animate,
            "animateColor" => ElementKind::AnimateColor,
            "animateTransform" => ElementKind::AnimateTransform,
            _ => ElementKind::Unknown,
        }
    }

    /// Elements that push paint, font and opacity state when rendered.
    pub fn is_rendered(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            Svg | G
                | Use
                | Rect
                | Circle
                | Ellipse
                | Line
                | Polyline
                | Polygon
                | Path
                | Glyph
                | MissingGlyph
                | Image
        ) || self.is_text()
    }

    pub fn is_text(self) -> bool {
        use ElementKind::*;
        matches!(self, Text | TSpan | TRef | A | TextPath | TextNode)
    }

    /// Elements whose geometry comes from [`ElementRef::path`].
    pub fn is_shape(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            Rect | Circle | Ellipse | Line | Polyline | Polygon | Path | Glyph | MissingGlyph
        )
    }

    /// Elements that only draw when something references them.
    pub fn is_definition_only(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            Defs | Symbol
                | Pattern
                | Marker
                | LinearGradient
                | RadialGradient
                | Stop
                | Mask
                | ClipPath
                | Filter
                | FeColorMatrix
                | FeGaussianBlur
                | FeDropShadow
                | FeMorphology
                | FeComposite
                | Font
                | FontFace
                | Style
                | Title
                | Desc
                | Animate
                | AnimateColor
                | AnimateTransform
        )
    }

    pub fn is_filter_primitive(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            FeColorMatrix | FeGaussianBlur | FeDropShadow | FeMorphology | FeComposite
        )
    }
}

/// A style slot. `Attribute` aliases the same-named attribute so that later
/// writes to either are seen through both.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StyleEntry {
    Own(Value),
    Attribute,
}

/// Kind-specific state computed once the tree is built.
#[derive(Debug, Default)]
pub(crate) enum ElementData {
    #[default]
    None,
    Path(Vec<PathCommand>),
    Points(Vec<Point>),
    Glyph(svg_font::GlyphData),
    Font(svg_font::FontData),
    TextPath(text_path::TextPathData),
    Image(image::ImageSource),
    Animate(animate::AnimateState),
    ColorMatrix(effects::ColorMatrix),
    GaussianBlur(f64),
    /// Filter primitives that parse but do not draw. The flag records
    /// whether the warning has been logged.
    UnsupportedPrimitive(Cell<bool>),
}

#[derive(Debug)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) kind: ElementKind,
    pub(crate) parent: Cell<Option<NodeId>>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: RefCell<HashMap<String, Value>>,
    pub(crate) styles: RefCell<HashMap<String, StyleEntry>>,
    pub(crate) text: String,
    pub(crate) data: ElementData,
    pub(crate) is_root: bool,
    /// Set on the synthetic `svg` wrappers that markers, patterns and
    /// symbols render through.
    pub(crate) virtual_of: Option<ElementKind>,
    pub(crate) virtual_svg: Option<NodeId>,
    pub(crate) animation_frozen: Cell<bool>,
    pub(crate) animation_frozen_value: RefCell<Option<String>>,
    pub(crate) modified_em_size: Cell<bool>,
    pub(crate) effects_suspended: Cell<bool>,
    pub(crate) measure_cache: Cell<Option<f64>>,
    pub(crate) position: Cell<Point>,
}

impl Element {
    pub(crate) fn new(tag: &str, kind: ElementKind, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            kind,
            parent: Cell::new(parent),
            children: Vec::new(),
            attributes: RefCell::new(HashMap::new()),
            styles: RefCell::new(HashMap::new()),
            text: String::new(),
            data: ElementData::None,
            is_root: false,
            virtual_of: None,
            virtual_svg: None,
            animation_frozen: Cell::new(false),
            animation_frozen_value: RefCell::new(None),
            modified_em_size: Cell::new(false),
            effects_suspended: Cell::new(false),
            measure_cache: Cell::new(None),
            position: Cell::new(Point::default()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub(crate) fn set_attribute_value(&self, name: &str, value: Value) {
        self.attributes.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn set_style_value(&self, name: &str, value: Value) {
        self.styles
            .borrow_mut()
            .insert(name.to_string(), StyleEntry::Own(value));
    }

    pub(crate) fn remove_style(&self, name: &str) {
        self.styles.borrow_mut().remove(name);
    }

    /// Drops every attribute and style, for virtual wrappers that are
    /// re-parameterized on each use.
    pub(crate) fn reset(&self) {
        self.attributes.borrow_mut().clear();
        self.styles.borrow_mut().clear();
    }
}

/// A borrowed handle to one element of a document.
#[derive(Clone, Copy)]
pub struct ElementRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl std::fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("tag", &self.node().tag)
            .finish()
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl<'d> ElementRef<'d> {
    pub(crate) fn new(doc: &'d Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub(crate) fn node(&self) -> &'d Element {
        self.doc.node(self.id)
    }

    pub fn kind(&self) -> ElementKind {
        self.node().kind
    }

    pub fn tag(&self) -> &'d str {
        &self.node().tag
    }

    pub fn parent(&self) -> Option<ElementRef<'d>> {
        self.node().parent.get().map(|id| ElementRef::new(self.doc, id))
    }

    pub(crate) fn set_parent(&self, parent: Option<NodeId>) {
        self.node().parent.set(parent);
    }

    pub fn children(&self) -> impl Iterator<Item = ElementRef<'d>> + 'd {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |id| ElementRef::new(doc, *id))
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn first_child(&self) -> Option<ElementRef<'d>> {
        self.children().next()
    }

    /// True when this element is its parent's first child.
    pub fn is_first_child(&self) -> bool {
        self.parent()
            .and_then(|parent| parent.first_child())
            .is_some_and(|first| first.id == self.id)
    }

    pub fn ancestors(&self) -> impl Iterator<Item = ElementRef<'d>> + 'd {
        std::iter::successors(self.parent(), |element| element.parent())
    }

    /// The element's own text, for text nodes and text-only spans.
    pub fn text(&self) -> &'d str {
        &self.node().text
    }

    pub(crate) fn virtual_svg(&self) -> Option<ElementRef<'d>> {
        self.node()
            .virtual_svg
            .map(|id| ElementRef::new(self.doc, id))
    }

    /// The attribute's value; a detached empty property when absent.
    pub fn get_attribute(&self, name: &str) -> Property<'d> {
        match self.node().attributes.borrow().get(name) {
            Some(value) => Property::owned(self.doc, name, value.clone(), self.id, Slot::Attribute),
            None => Property::new(self.doc, name, Value::Empty),
        }
    }

    /// The attribute, created empty when absent so that writes persist.
    pub fn ensure_attribute(&self, name: &str) -> Property<'d> {
        let value = self
            .node()
            .attributes
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(Value::Empty)
            .clone();
        Property::owned(self.doc, name, value, self.id, Slot::Attribute)
    }

    pub(crate) fn set_attribute(&self, name: &str, value: impl Into<Value>) {
        self.node().set_attribute_value(name, value.into());
    }

    /// `href` in any namespace.
    pub fn get_href_attribute(&self) -> Property<'d> {
        let attributes = self.node().attributes.borrow();
        let found = attributes
            .get_key_value("href")
            .or_else(|| attributes.iter().find(|(key, _)| key.ends_with(":href")));
        match found {
            Some((key, value)) => {
                Property::owned(self.doc, key, value.clone(), self.id, Slot::Attribute)
            }
            None => Property::new(self.doc, "href", Value::Empty),
        }
    }

    /// Cascaded style lookup with inheritance.
    pub fn get_style(&self, name: &str) -> Property<'d> {
        self.get_style_with(name, false, false)
    }

    /// Style lookup that never consults ancestors.
    pub fn get_own_style(&self, name: &str) -> Property<'d> {
        self.get_style_with(name, false, true)
    }

    /// Own style, else the same-named attribute (cached as an alias), else
    /// the parent's value, else a new empty style when `create` is set.
    pub fn get_style_with(&self, name: &str, create: bool, skip_ancestors: bool) -> Property<'d> {
        let node = self.node();
        let entry = node.styles.borrow().get(name).cloned();
        match entry {
            Some(StyleEntry::Own(value)) => {
                return Property::owned(self.doc, name, value, self.id, Slot::Style);
            }
            Some(StyleEntry::Attribute) => return self.get_attribute(name),
            None => {}
        }

        let attribute = self.get_attribute(name);
        if attribute.has_value() {
            node.styles
                .borrow_mut()
                .insert(name.to_string(), StyleEntry::Attribute);
            return attribute;
        }

        if !skip_ancestors {
            if let Some(parent) = self.parent() {
                let inherited = parent.get_style(name);
                if inherited.has_value() {
                    return inherited;
                }
            }
        }

        if create {
            let value = Value::Text(String::new());
            node.set_style_value(name, value.clone());
            return Property::owned(self.doc, name, value, self.id, Slot::Style);
        }

        Property::new(self.doc, name, Value::Empty)
    }

    pub(crate) fn set_style(&self, name: &str, value: impl Into<Value>) {
        self.node().set_style_value(name, value.into());
    }

    /// Draws the element and its subtree.
    pub fn render(self, ctx: &mut dyn RenderingContext) {
        let kind = self.kind();
        if kind.is_definition_only() {
            return;
        }
        if self.get_style("display").get_string() == "none" {
            return;
        }
        if matches!(
            self.get_style("visibility").get_string().as_str(),
            "hidden" | "collapse"
        ) {
            return;
        }

        ctx.save();
        let suspended = self.node().effects_suspended.get();
        let mask = self.get_own_style("mask");
        let filter = self.get_own_style("filter");
        let mask_definition = (!suspended && mask.has_value())
            .then(|| mask.get_definition())
            .flatten()
            .filter(|definition| definition.kind() == ElementKind::Mask);
        let filter_definition = (!suspended && filter.get_value_or("none") != "none")
            .then(|| filter.get_definition())
            .flatten()
            .filter(|definition| definition.kind() == ElementKind::Filter);

        if let Some(mask) = mask_definition {
            self.apply_effects(ctx);
            effects::apply_mask(mask, ctx, self);
        } else if let Some(filter) = filter_definition {
            self.apply_effects(ctx);
            effects::apply_filter(filter, ctx, self);
        } else {
            self.set_context(ctx, false);
            self.render_children(ctx);
            self.clear_context(ctx);
        }
        ctx.restore();
    }

    /// Runs `f` with this element's transform, clip, mask and filter
    /// disabled, for re-rendering it onto an offscreen surface.
    pub(crate) fn with_effects_suspended<R>(self, f: impl FnOnce() -> R) -> R {
        let flag = &self.node().effects_suspended;
        let previous = flag.replace(true);
        let result = f();
        flag.set(previous);
        result
    }

    /// Pushes this element's drawing state onto `ctx`. `from_measure` skips
    /// paint, transforms and opacity so only font state is applied.
    pub fn set_context(self, ctx: &mut dyn RenderingContext, from_measure: bool) {
        match self.kind() {
            ElementKind::Svg => structure::svg_set_context(self, ctx),
            ElementKind::Use => structure::use_set_context(self, ctx),
            kind if kind.is_text() => text::set_context(self, ctx, from_measure),
            kind if kind.is_rendered() => rendered::set_context(self, ctx, from_measure),
            _ => {}
        }
    }

    pub fn clear_context(self, ctx: &mut dyn RenderingContext) {
        match self.kind() {
            ElementKind::Svg => structure::svg_clear_context(self, ctx),
            kind if kind.is_rendered() => rendered::clear_context(self, ctx),
            _ => {}
        }
    }

    pub fn render_children(self, ctx: &mut dyn RenderingContext) {
        match self.kind() {
            kind if kind.is_shape() => path::render_shape(self, ctx),
            ElementKind::Use => structure::use_render_children(self, ctx),
            ElementKind::Text => text::render_text_children(self, ctx),
            ElementKind::TSpan | ElementKind::TRef | ElementKind::TextNode => {
                text::render_leaf(self, ctx)
            }
            ElementKind::A => text::render_anchor(self, ctx),
            ElementKind::TextPath => text_path::render_children(self, ctx),
            ElementKind::Image => image::render(self, ctx),
            _ => self.render_each_child(ctx),
        }
    }

    pub(crate) fn render_each_child(self, ctx: &mut dyn RenderingContext) {
        for child in self.children() {
            child.render(ctx);
        }
    }

    /// Builds the element's geometry into `ctx`, or only measures it when
    /// `ctx` is `None`. Returns `None` when there is no geometry.
    pub fn path(self, ctx: Option<&mut dyn RenderingContext>) -> Option<BoundingBox> {
        match self.kind() {
            ElementKind::Path | ElementKind::Glyph | ElementKind::MissingGlyph => {
                path::path_commands(self, ctx)
            }
            ElementKind::Rect => shapes::rect_path(self, ctx),
            ElementKind::Circle => shapes::circle_path(self, ctx),
            ElementKind::Ellipse => shapes::ellipse_path(self, ctx),
            ElementKind::Line => shapes::line_path(self, ctx),
            ElementKind::Polyline => shapes::polyline_path(self, ctx, false),
            ElementKind::Polygon => shapes::polyline_path(self, ctx, true),
            ElementKind::Use => structure::use_target(self).and_then(|target| target.path(ctx)),
            ElementKind::TextPath => text_path::path(self, ctx),
            _ => None,
        }
    }

    /// Whether [`ElementRef::path`] can contribute geometry, e.g. to a clip.
    pub fn has_path(self) -> bool {
        self.kind().is_shape() || matches!(self.kind(), ElementKind::Use | ElementKind::TextPath)
    }

    /// Untransformed bounds in the element's user space.
    pub fn get_bounding_box(self, ctx: &mut dyn RenderingContext) -> Option<BoundingBox> {
        match self.kind() {
            kind if kind.is_shape() => self.path(None),
            ElementKind::Text => text::text_bounding_box(self, ctx),
            ElementKind::TSpan
            | ElementKind::TRef
            | ElementKind::TextNode
            | ElementKind::TextPath => Some(text::leaf_bounding_box(self, ctx)),
            ElementKind::A if self.child_count() == 0 => Some(text::leaf_bounding_box(self, ctx)),
            ElementKind::Use => {
                structure::use_target(self).and_then(|target| target.get_bounding_box(ctx))
            }
            ElementKind::Image => Some(image::bounding_box(self)),
            ElementKind::G | ElementKind::Svg | ElementKind::A | ElementKind::Unknown => {
                let mut bbox = BoundingBox::empty();
                for child in self.children() {
                    bbox.add_bounding_box(child.get_bounding_box(ctx).as_ref());
                }
                (!bbox.is_empty()).then_some(bbox)
            }
            _ => None,
        }
    }

    /// Marker vertices for path-like shapes.
    pub fn get_markers(self) -> Option<Vec<Marker>> {
        match self.kind() {
            ElementKind::Path | ElementKind::Glyph | ElementKind::MissingGlyph => {
                Some(path::markers(self))
            }
            ElementKind::Line => Some(shapes::line_markers(self)),
            ElementKind::Polyline | ElementKind::Polygon => Some(shapes::polyline_markers(self)),
            _ => None,
        }
    }

    /// Applies the own transform and clip-path.
    pub(crate) fn apply_effects(self, ctx: &mut dyn RenderingContext) {
        rendered::apply_effects(self, ctx);
    }

    /// Product of own `opacity` values along the ancestor chain.
    pub fn calculate_opacity(self) -> f64 {
        rendered::calculate_opacity(self)
    }

    pub(crate) fn on_click(self) {
        if self.kind() == ElementKind::A {
            let href = self.get_href_attribute().get_string();
            self.doc.navigate(&href);
        }
    }

    pub(crate) fn on_mouse_move(self) {
        if self.kind() == ElementKind::A {
            self.doc.screen.set_cursor("pointer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc(svg: &str) -> Document {
        Document::from_string(svg).unwrap()
    }

    #[test]
    fn test_style_falls_back_to_attribute_then_parent() {
        let doc = doc(
            "<svg xmlns='http://www.w3.org/2000/svg' fill='red'>\
               <g stroke='blue'><rect id='r' stroke-width='3'/></g>\
             </svg>",
        );
        let rect = doc.get_element_by_id("r").unwrap();
        assert_eq!(rect.get_style("stroke-width").get_string(), "3");
        assert_eq!(rect.get_style("stroke").get_string(), "blue");
        assert_eq!(rect.get_style("fill").get_string(), "red");
        assert!(!rect.get_own_style("fill").has_value());
    }

    #[test]
    fn test_attribute_alias_sees_later_writes() {
        let doc = doc("<svg xmlns='http://www.w3.org/2000/svg'><rect id='r' x='1'/></svg>");
        let rect = doc.get_element_by_id("r").unwrap();
        assert_eq!(rect.get_style("x").get_string(), "1");
        rect.ensure_attribute("x").set_value("7");
        assert_eq!(rect.get_style("x").get_string(), "7");
    }

    #[test]
    fn test_created_style_stops_inheritance() {
        let doc = doc(
            "<svg xmlns='http://www.w3.org/2000/svg' color='red'><g id='g'/></svg>",
        );
        let g = doc.get_element_by_id("g").unwrap();
        let created = g.get_style_with("opacity", true, false);
        assert!(!created.has_value());
        assert!(g.node().styles.borrow().contains_key("opacity"));
        assert_eq!(g.get_style("color").get_string(), "red");
    }

    #[test]
    fn test_href_in_any_namespace() {
        let doc = doc(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
               <use id='a' xlink:href='#x'/><use id='b' href='#y'/>\
             </svg>",
        );
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        assert_eq!(a.get_href_attribute().get_string(), "#x");
        assert_eq!(b.get_href_attribute().get_string(), "#y");
    }

    #[test]
    fn test_unknown_tags_keep_children() {
        let doc = doc(
            "<svg xmlns='http://www.w3.org/2000/svg'><blink><rect id='r'/></blink></svg>",
        );
        let rect = doc.get_element_by_id("r").unwrap();
        let parent = rect.parent().unwrap();
        assert_eq!(parent.kind(), ElementKind::Unknown);
        assert_eq!(parent.tag(), "blink");
    }
}
