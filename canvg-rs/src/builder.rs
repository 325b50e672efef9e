//! Turns a parsed XML tree into a [`Document`].
//!
//! Building runs in two passes. The first walks the XML, creating one
//! [`Element`] per node with its attributes, cascaded styles and captured
//! text. The second computes the kind-specific data (path commands, font
//! tables, animation timing, image loads) that needs the finished tree.

use crate::css::{self, StyleRule};
use crate::document::{Document, NavigateHook, PendingFontFace};
use crate::element::animate::AnimateState;
use crate::element::effects::ColorMatrix;
use crate::element::image::ImageSource;
use crate::element::svg_font::{font_data, FontData, GlyphData};
use crate::element::text_path::TextPathData;
use crate::element::{Element, ElementData, ElementKind, ElementRef, NodeId};
use crate::error::{CanvgError, CanvgResult};
use crate::geometry::Point;
use crate::path_parser::parse_path_data;
use crate::property::Value;
use crate::resources::ResourceLoader;
use crate::util::{compress_spaces, to_numbers, trim_left, trim_right};
use std::cell::Cell;
use std::collections::HashMap;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn build(
    xml: &roxmltree::Document<'_>,
    loader: ResourceLoader,
    navigate: Option<NavigateHook>,
) -> CanvgResult<Document> {
    if let Some(error) = xml
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "parsererror")
    {
        return Err(CanvgError::ParserError(text_content(error).trim().to_string()));
    }
    let root = xml.root_element();
    if root.tag_name().name() != "svg" {
        return Err(CanvgError::MissingRoot);
    }

    let sheets: Vec<String> = xml
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "style")
        .map(|style| css::prepare(&text_content(style)))
        .collect();
    let rules: Vec<StyleRule<'_>> = sheets.iter().flat_map(|sheet| css::parse_rules(sheet)).collect();
    log::debug!(
        target: "canvg::parser",
        "{} style sheets, {} rules",
        sheets.len(),
        rules.len()
    );

    let mut document = Document::new(loader, navigate);
    let mut builder = TreeBuilder {
        document: &mut document,
        rules: &rules,
    };
    let root_id = builder.build_element(root, None);
    document.root = root_id;
    document.nodes[root_id].is_root = true;

    compute_element_data(&mut document, 0);
    spawn_font_faces(&mut document, &sheets);
    document.install_font_faces();
    log::debug!(
        target: "canvg::parser",
        "built {} elements, {} definitions",
        document.nodes.len(),
        document.definitions.len()
    );
    Ok(document)
}

struct TreeBuilder<'b, 'r> {
    document: &'b mut Document,
    rules: &'b [StyleRule<'r>],
}

impl TreeBuilder<'_, '_> {
    fn push(&mut self, element: Element) -> NodeId {
        self.document.nodes.push(element);
        self.document.nodes.len() - 1
    }

    fn build_element(&mut self, node: roxmltree::Node<'_, '_>, parent: Option<NodeId>) -> NodeId {
        let tag = node.tag_name().name();
        let kind = ElementKind::from_tag(tag);
        if kind == ElementKind::Unknown {
            log::debug!(target: "canvg::parser", "unknown element <{tag}> renders its children");
        }
        let mut element = Element::new(tag, kind, parent);
        copy_attributes(&element, node);
        self.apply_styles(&element, node);
        if let Some(id) = node.attribute("id") {
            let node_id = self.document.nodes.len();
            self.document.define_if_absent(id, node_id);
        }

        let capture_text_nodes = match kind {
            ElementKind::Text => true,
            ElementKind::TSpan => node.children().any(|child| child.is_element()),
            _ => false,
        };
        let own_text = match kind {
            ElementKind::TSpan | ElementKind::TextPath if !capture_text_nodes => true,
            ElementKind::A => node.children().all(|child| child.is_text()),
            _ => false,
        };
        if own_text {
            element.text = text_from_node(node);
        }

        let id = self.push(element);
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(self.build_element(child, Some(id)));
            } else if capture_text_nodes && child.is_text() {
                let text = text_from_node(child);
                if !text.is_empty() {
                    let mut text_node = Element::new("#text", ElementKind::TextNode, Some(id));
                    text_node.text = text;
                    children.push(self.push(text_node));
                }
            }
        }

        if matches!(
            kind,
            ElementKind::Marker | ElementKind::Pattern | ElementKind::Symbol
        ) {
            let mut wrapper = Element::new("svg", ElementKind::Svg, Some(id));
            wrapper.virtual_of = Some(kind);
            wrapper.children = children.clone();
            let wrapper = self.push(wrapper);
            self.document.nodes[id].virtual_svg = Some(wrapper);
        }
        self.document.nodes[id].children = children;
        id
    }

    /// Stylesheet declarations in rule order, each property kept from the
    /// most specific rule, then the inline `style` attribute on top.
    fn apply_styles(&self, element: &Element, node: roxmltree::Node<'_, '_>) {
        let mut specificities: HashMap<&str, [u16; 3]> = HashMap::new();
        for rule in self.rules.iter().filter(|rule| rule.matches(node)) {
            for &(name, value) in &rule.declarations {
                let existing = specificities.get(name).copied().unwrap_or_default();
                if rule.specificity >= existing {
                    element.set_style_value(name, Value::Text(value.trim().to_string()));
                    specificities.insert(name, rule.specificity);
                }
            }
        }
        if let Some(style) = node.attribute("style") {
            for (name, value) in css::parse_inline_style(style) {
                element.set_style_value(&name, Value::Text(value));
            }
        }
    }
}

/// Attributes keyed by local name; XLink and XML attributes keep their
/// conventional prefix. Attributes in other namespaces are dropped.
fn copy_attributes(element: &Element, node: roxmltree::Node<'_, '_>) {
    for attribute in node.attributes() {
        let name = match attribute.namespace() {
            None | Some(SVG_NS) => attribute.name().to_string(),
            Some(XLINK_NS) => format!("xlink:{}", attribute.name()),
            Some(XML_NS) => format!("xml:{}", attribute.name()),
            Some(_) => continue,
        };
        element.set_attribute_value(&name, Value::Text(attribute.value().to_string()));
    }
}

fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|descendant| descendant.is_text())
        .filter_map(|descendant| descendant.text())
        .collect()
}

/// Collapsed text of `node`, trimmed at the edges of its parent.
fn text_from_node(node: roxmltree::Node<'_, '_>) -> String {
    let text = compress_spaces(&text_content(node));
    let mut text = text.as_str();
    if node.prev_sibling().is_none() {
        text = trim_left(text);
    }
    if node.next_sibling().is_none() {
        text = trim_right(text);
    }
    text.to_string()
}

/// Starts loading every `@font-face` SVG source. The slots are polled with
/// the document's other resources.
fn spawn_font_faces(document: &mut Document, sheets: &[String]) {
    for face in sheets.iter().flat_map(|sheet| css::parse_font_faces(sheet)) {
        let resource = document.loader().spawn(&face.url);
        document.font_faces.push(PendingFontFace {
            family: face.family,
            resource,
        });
    }
}

/// Builds the `<font>` elements of a loaded SVG font source into the arena,
/// detached from the tree, and registers `family` for the first of them.
pub(crate) fn install_font_face(document: &mut Document, family: &str, url: &str, bytes: &[u8]) {
    let markup = String::from_utf8_lossy(bytes);
    let xml = match crate::parser::parse_xml(&markup) {
        Ok(xml) => xml,
        Err(err) => {
            log::error!(target: "canvg::resources", "Error while parsing font \"{url}\": {err}");
            return;
        }
    };

    let first = document.nodes.len();
    let holder = first;
    document
        .nodes
        .push(Element::new("defs", ElementKind::Defs, None));
    let mut builder = TreeBuilder {
        document: &mut *document,
        rules: &[],
    };
    let fonts: Vec<NodeId> = xml
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "font")
        .map(|font| builder.build_element(font, Some(holder)))
        .collect();
    document.nodes[holder].children.extend(&fonts);
    compute_element_data(document, first);

    match fonts.first() {
        Some(font) => {
            log::debug!(target: "canvg::resources", "loaded SVG font {family} from {url}");
            document.define(family, *font);
        }
        None => log::warn!(target: "canvg::resources", "no <font> element in \"{url}\""),
    }
}

/// Computes kind-specific data for every node from `first` on.
fn compute_element_data(document: &mut Document, first: NodeId) {
    let mut computed = Vec::new();
    let mut families = Vec::new();
    {
        let doc: &Document = document;
        for id in first..doc.nodes.len() {
            let element = doc.element(id);
            let data = match element.kind() {
                ElementKind::Path => {
                    ElementData::Path(parse_path_data(&element.get_attribute("d").get_string()))
                }
                ElementKind::Polyline | ElementKind::Polygon => {
                    ElementData::Points(Point::parse_path(&element.get_attribute("points").get_string()))
                }
                ElementKind::Glyph | ElementKind::MissingGlyph => {
                    ElementData::Glyph(GlyphData::from_element(element))
                }
                ElementKind::Font => {
                    let font = FontData::from_element(element);
                    if let Some(family) = &font.family {
                        families.push((family.clone(), id));
                    }
                    ElementData::Font(font)
                }
                ElementKind::TextPath => ElementData::TextPath(text_path_data(element)),
                ElementKind::Image => {
                    let href = element.get_href_attribute().get_string();
                    if href.is_empty() {
                        continue;
                    }
                    ElementData::Image(ImageSource::load(&href, doc.loader()))
                }
                ElementKind::Animate | ElementKind::AnimateColor | ElementKind::AnimateTransform => {
                    doc.screen.register_animation(id);
                    ElementData::Animate(AnimateState::from_element(element))
                }
                ElementKind::FeColorMatrix => {
                    let kind = element.get_attribute("type").get_string_or("matrix");
                    let values = to_numbers(&element.get_attribute("values").get_string());
                    let include_opacity = element.get_attribute("includeOpacity").has_value();
                    ElementData::ColorMatrix(ColorMatrix::new(&kind, &values, include_opacity))
                }
                ElementKind::FeGaussianBlur => {
                    ElementData::GaussianBlur(element.get_attribute("stdDeviation").get_number())
                }
                ElementKind::FeDropShadow | ElementKind::FeMorphology | ElementKind::FeComposite => {
                    ElementData::UnsupportedPrimitive(Cell::new(false))
                }
                _ => continue,
            };
            computed.push((id, data));
        }
    }

    for (id, data) in computed {
        if matches!(data, ElementData::Image(_)) {
            document.images.push(id);
        }
        document.nodes[id].data = data;
    }
    for (family, id) in families {
        if font_data(document.element(id)).is_some() {
            document.define(&family, id);
        }
    }
}

fn text_path_data(element: ElementRef<'_>) -> TextPathData {
    match element.get_href_attribute().get_definition() {
        Some(path) => TextPathData::new(&parse_path_data(&path.get_attribute("d").get_string())),
        None => TextPathData::default(),
    }
}
