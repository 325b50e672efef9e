//! Typed, unit-aware access to a single attribute or style value.
//!
//! A [`Property`] is a cheap view over a raw value plus the document it came
//! from. Units are resolved at read time against the current viewport and
//! em-size stack, so the same property can yield different pixel values as
//! rendering enters and leaves nested contexts.

use crate::color::Color;
use crate::context::{Paint, RenderingContext, TextBaseline};
use crate::document::Document;
use crate::element::{ElementKind, ElementRef, NodeId};
use crate::util::{normalize_color, parse_leading_float};
use std::f64::consts::PI;

/// Which viewport dimension a percentage resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    X,
    Y,
    /// `sqrt(w² + h²) / sqrt(2)`
    #[default]
    Diagonal,
}

/// A raw attribute or style value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Value {
    pub fn as_string(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Text(text) => text.clone(),
            Value::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Text).unwrap_or(Value::Empty)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Where a property writes back to when its value is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Attribute,
    Style,
}

#[derive(Clone)]
pub struct Property<'d> {
    document: &'d Document,
    name: String,
    value: Value,
    owner: Option<(NodeId, Slot)>,
}

impl std::fmt::Debug for Property<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl<'d> Property<'d> {
    pub fn new(document: &'d Document, name: &str, value: impl Into<Value>) -> Self {
        Self {
            document,
            name: name.to_string(),
            value: value.into(),
            owner: None,
        }
    }

    pub fn empty(document: &'d Document) -> Self {
        Self::new(document, "EMPTY", Value::Empty)
    }

    pub(crate) fn owned(
        document: &'d Document,
        name: &str,
        value: Value,
        owner: NodeId,
        slot: Slot,
    ) -> Self {
        Self {
            document,
            name: name.to_string(),
            value,
            owner: Some((owner, slot)),
        }
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Empty strings and the number zero count as "no value".
    pub fn has_value(&self) -> bool {
        self.has_value_with(false)
    }

    pub fn has_value_with(&self, zero_is_value: bool) -> bool {
        match &self.value {
            Value::Empty => false,
            Value::Text(text) => !text.is_empty(),
            Value::Number(n) => zero_is_value || *n != 0.0,
        }
    }

    /// Replaces the value, writing through to the owning element if any.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
        if let Some((node, slot)) = self.owner {
            let element = self.document.node(node);
            match slot {
                Slot::Attribute => element.set_attribute_value(&self.name, self.value.clone()),
                Slot::Style => element.set_style_value(&self.name, self.value.clone()),
            }
        }
    }

    pub fn get_value_or(&self, default: &str) -> String {
        if self.has_value() {
            self.value.as_string()
        } else {
            default.to_string()
        }
    }

    pub fn get_string(&self) -> String {
        self.value.as_string()
    }

    pub fn get_string_or(&self, default: &str) -> String {
        if self.has_value() {
            self.get_string()
        } else {
            default.to_string()
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.value, Value::Text(_))
    }

    pub fn is_url_definition(&self) -> bool {
        matches!(&self.value, Value::Text(text) if text.starts_with("url("))
    }

    pub fn is_pixels(&self) -> bool {
        if !self.has_value() {
            return false;
        }
        let text = self.get_string();
        text.ends_with("px") || (!text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
    }

    /// Splits on whitespace into sibling properties of the same name.
    pub fn split(&self) -> Vec<Property<'d>> {
        if !self.has_value() {
            return Vec::new();
        }
        crate::util::compress_spaces(&self.get_string())
            .trim()
            .split(' ')
            .filter(|part| !part.is_empty())
            .map(|part| Property::new(self.document, &self.name, part))
            .collect()
    }

    /// The numeric value; percentages come back as fractions.
    pub fn get_number(&self) -> f64 {
        self.get_number_or(0.0)
    }

    pub fn get_number_or(&self, default: f64) -> f64 {
        if !self.has_value() {
            return default;
        }
        match &self.value {
            Value::Number(n) => *n,
            Value::Text(text) => {
                let mut n = parse_leading_float(text);
                if n.is_nan() {
                    return 0.0;
                }
                if text.trim_end().ends_with('%') {
                    n /= 100.0;
                }
                n
            }
            Value::Empty => default,
        }
    }

    /// The non-numeric suffix, e.g. `px` or `%`.
    pub fn get_units(&self) -> String {
        self.get_string()
            .chars()
            .filter(|c| !(c.is_ascii_digit() || *c == '.' || *c == '-'))
            .collect()
    }

    /// The color string with float `rgb()` channels rounded.
    pub fn get_color(&self) -> String {
        normalize_color(&self.get_string())
    }

    pub fn get_color_or(&self, default: &str) -> String {
        normalize_color(&self.get_string_or(default))
    }

    pub fn get_dpi(&self) -> f64 {
        96.0
    }

    pub fn get_em(&self) -> f64 {
        self.document.em_size()
    }

    pub fn get_rem(&self) -> f64 {
        self.document.root_em_size()
    }

    /// Resolves a length to pixels.
    pub fn get_pixels(&self, axis: Axis) -> f64 {
        self.get_pixels_with(axis, false)
    }

    /// With `process_percent`, plain numbers below 1 are treated as
    /// fractions of the viewport.
    pub fn get_pixels_with(&self, axis: Axis, process_percent: bool) -> f64 {
        self.resolve_pixels(axis, false, process_percent)
    }

    /// Resolves a font size: percentages scale the current em size.
    pub fn get_font_size_pixels(&self) -> f64 {
        self.resolve_pixels(Axis::Diagonal, true, false)
    }

    fn resolve_pixels(&self, axis: Axis, is_font_size: bool, process_percent: bool) -> f64 {
        if !self.has_value() {
            return 0.0;
        }
        let value = self.get_string();
        let value = value.trim();
        let n = self.get_number();
        let view_port = self.document.screen.view_port();
        let compute = |axis| view_port.compute_size(axis);

        if value.ends_with("vmin") {
            n / 100.0 * compute(Axis::X).min(compute(Axis::Y))
        } else if value.ends_with("vmax") {
            n / 100.0 * compute(Axis::X).max(compute(Axis::Y))
        } else if value.ends_with("vw") {
            n / 100.0 * compute(Axis::X)
        } else if value.ends_with("vh") {
            n / 100.0 * compute(Axis::Y)
        } else if value.ends_with("rem") {
            n * self.get_rem()
        } else if value.ends_with("em") {
            n * self.get_em()
        } else if value.ends_with("ex") {
            n * self.get_em() / 2.0
        } else if value.ends_with("px") {
            n
        } else if value.ends_with("pt") {
            n * self.get_dpi() / 72.0
        } else if value.ends_with("pc") {
            n * 15.0
        } else if value.ends_with("cm") {
            n * self.get_dpi() / 2.54
        } else if value.ends_with("mm") {
            n * self.get_dpi() / 25.4
        } else if value.ends_with("in") {
            n * self.get_dpi()
        } else if value.ends_with('%') && is_font_size {
            n * self.get_em()
        } else if value.ends_with('%') {
            n * compute(axis)
        } else if process_percent && n < 1.0 {
            n * compute(axis)
        } else {
            n
        }
    }

    pub fn get_milliseconds(&self) -> f64 {
        if !self.has_value() {
            return 0.0;
        }
        if self.get_string().ends_with("ms") {
            return self.get_number();
        }
        self.get_number() * 1000.0
    }

    /// Angles default to degrees.
    pub fn get_radians(&self) -> f64 {
        if !self.has_value() {
            return 0.0;
        }
        let text = self.get_string();
        let n = self.get_number();
        if text.ends_with("grad") {
            n * PI / 200.0
        } else if text.ends_with("rad") {
            n
        } else {
            n * PI / 180.0
        }
    }

    /// Looks up `url(#id)` / `#id` / bare `id` in the definitions table.
    pub fn get_definition(&self) -> Option<ElementRef<'d>> {
        let text = self.get_string();
        let name = match text.find('#') {
            Some(start) => {
                let rest = &text[start + 1..];
                let end = rest
                    .find(|c| c == ')' || c == '\'' || c == '"')
                    .unwrap_or(rest.len());
                &rest[..end]
            }
            None => text.as_str(),
        };
        if name.is_empty() {
            return None;
        }
        self.document.get_definition(name)
    }

    /// Resolves a gradient or pattern reference into a paint.
    pub fn get_fill_style_definition(
        &self,
        ctx: &mut dyn RenderingContext,
        element: ElementRef<'d>,
        opacity: &Property<'d>,
    ) -> Option<Paint> {
        let definition = self.get_definition()?;
        match definition.kind() {
            ElementKind::LinearGradient | ElementKind::RadialGradient => {
                crate::element::paint::create_gradient(definition, ctx, element, opacity)
            }
            ElementKind::Pattern => {
                let mut pattern = definition;
                let href = definition.get_href_attribute();
                if href.has_value() {
                    let pattern_transform = definition.get_attribute("patternTransform");
                    if let Some(target) = href.get_definition() {
                        pattern = target;
                        if pattern_transform.has_value() {
                            pattern
                                .ensure_attribute("patternTransform")
                                .set_value(pattern_transform.value().clone());
                        }
                    }
                }
                crate::element::paint::create_pattern(pattern, ctx, element, opacity)
            }
            _ => {
                log::warn!(
                    target: "canvg::render",
                    "#{} is not a paint server",
                    definition.get_attribute("id").get_string()
                );
                None
            }
        }
    }

    pub fn get_text_baseline(&self) -> Option<TextBaseline> {
        if !self.has_value() {
            return None;
        }
        TextBaseline::from_svg(&self.get_string())
    }

    /// Folds `opacity` into the color as an `rgba()` string.
    ///
    /// Colors that already spell out an alpha channel are left alone.
    pub fn add_opacity(&self, opacity: &Property<'d>) -> Property<'d> {
        let mut value = self.get_color();
        let commas = value.chars().filter(|c| *c == ',').take(3).count();
        if opacity.has_value() && self.is_string() && commas != 3 {
            if let Some(color) = Color::parse(&value) {
                value = color.with_alpha(opacity.get_number()).to_rgba_string();
            }
        }
        Property::new(self.document, &self.name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use rstest::rstest;

    fn document() -> Document {
        Document::from_string("<svg xmlns='http://www.w3.org/2000/svg'/>").unwrap()
    }

    #[test]
    fn test_zero_is_not_a_value_unless_asked() {
        let doc = document();
        let zero = Property::new(&doc, "x", 0.0);
        assert!(!zero.has_value());
        assert!(zero.has_value_with(true));
        assert!(Property::new(&doc, "x", "0").has_value());
        assert!(!Property::new(&doc, "x", "").has_value());
    }

    #[rstest]
    #[case("10", 10.0)]
    #[case("10px", 10.0)]
    #[case("72pt", 96.0)]
    #[case("1in", 96.0)]
    #[case("2.54cm", 96.0)]
    #[case("25.4mm", 96.0)]
    #[case("2pc", 30.0)]
    #[case("2em", 24.0)]
    #[case("2ex", 12.0)]
    #[case("1rem", 12.0)]
    fn test_get_pixels_units(#[case] value: &str, #[case] expected: f64) {
        let doc = document();
        let px = Property::new(&doc, "width", value).get_pixels(Axis::X);
        assert!((px - expected).abs() < 1e-9, "{value} -> {px}");
    }

    #[test]
    fn test_percentages_follow_axis() {
        let doc = document();
        doc.screen.view_port_mut().set_current(200.0, 100.0);
        let prop = Property::new(&doc, "width", "50%");
        assert_eq!(prop.get_pixels(Axis::X), 100.0);
        assert_eq!(prop.get_pixels(Axis::Y), 50.0);
        let diagonal = (200.0f64.powi(2) + 100.0f64.powi(2)).sqrt() / 2.0f64.sqrt();
        assert!((prop.get_pixels(Axis::Diagonal) - diagonal * 0.5).abs() < 1e-9);
        assert_eq!(
            Property::new(&doc, "vw", "10vw").get_pixels(Axis::Y),
            20.0
        );
    }

    #[test]
    fn test_get_pixels_idempotent_and_em_sensitive() {
        let doc = document();
        let em = Property::new(&doc, "font-size", "2em");
        let px = Property::new(&doc, "width", "5px");
        let first = em.get_pixels(Axis::Diagonal);
        assert_eq!(first, em.get_pixels(Axis::Diagonal));

        doc.push_em_size(20.0);
        assert_eq!(em.get_pixels(Axis::Diagonal), 40.0);
        assert_eq!(px.get_pixels(Axis::Diagonal), 5.0);
        doc.pop_em_size();
        assert_eq!(em.get_pixels(Axis::Diagonal), first);
    }

    #[test]
    fn test_font_size_percent_uses_em() {
        let doc = document();
        doc.push_em_size(10.0);
        let prop = Property::new(&doc, "font-size", "150%");
        assert_eq!(prop.get_font_size_pixels(), 15.0);
    }

    #[rstest]
    #[case("90", PI / 2.0)]
    #[case("90deg", PI / 2.0)]
    #[case("100grad", PI / 2.0)]
    #[case("1.5rad", 1.5)]
    fn test_get_radians(#[case] value: &str, #[case] expected: f64) {
        let doc = document();
        let radians = Property::new(&doc, "angle", value).get_radians();
        assert!((radians - expected).abs() < 1e-12);
    }

    #[test]
    fn test_get_milliseconds() {
        let doc = document();
        assert_eq!(Property::new(&doc, "dur", "2s").get_milliseconds(), 2000.0);
        assert_eq!(Property::new(&doc, "dur", "250ms").get_milliseconds(), 250.0);
    }

    #[test]
    fn test_add_opacity() {
        let doc = document();
        let opacity = Property::new(&doc, "opacity", "0.5");
        let color = Property::new(&doc, "fill", "red").add_opacity(&opacity);
        assert_eq!(color.get_string(), "rgba(255, 0, 0, 0.5)");

        let explicit = Property::new(&doc, "fill", "rgba(0, 0, 255, 0.2)").add_opacity(&opacity);
        assert_eq!(explicit.get_string(), "rgba(0, 0, 255, 0.2)");
    }

    #[test]
    fn test_get_color_normalizes_channels() {
        let doc = document();
        let prop = Property::new(&doc, "fill", "rgb(10.4, 20.6, 30)");
        assert_eq!(prop.get_color(), "rgb(10, 21, 30)");
    }

    #[test]
    fn test_percent_number() {
        let doc = document();
        assert_eq!(Property::new(&doc, "offset", "50%").get_number(), 0.5);
        assert_eq!(Property::new(&doc, "offset", "junk").get_number(), 0.0);
    }
}
