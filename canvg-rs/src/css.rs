//! `<style>` sheets: selector matching against the XML tree, specificity and
//! `@font-face` rules that point at SVG fonts.

use crate::util::{parse_external_url, strip_css_comments};
use lazy_static::lazy_static;
use regex::Regex;
use simplecss::{AttributeOperator, DeclarationTokenizer, PseudoClass, Selector, StyleSheet};

lazy_static! {
    static ref FONT_FACE_RE: Regex = Regex::new(r"@font-face\s*\{([^}]*)\}").expect("valid regex");
}

/// An XML element seen through the selector matcher.
#[derive(Clone, Copy, Debug)]
pub(crate) struct XmlElement<'a, 'input>(pub roxmltree::Node<'a, 'input>);

impl simplecss::Element for XmlElement<'_, '_> {
    fn parent_element(&self) -> Option<Self> {
        self.0.parent_element().map(XmlElement)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.0.prev_sibling_element().map(XmlElement)
    }

    fn has_local_name(&self, name: &str) -> bool {
        self.0.tag_name().name() == name
    }

    fn attribute_matches(&self, local_name: &str, operator: AttributeOperator<'_>) -> bool {
        self.0
            .attribute(local_name)
            .is_some_and(|value| operator.matches(value))
    }

    fn pseudo_class_matches(&self, class: PseudoClass<'_>) -> bool {
        match class {
            PseudoClass::FirstChild => self.0.prev_sibling_element().is_none(),
            _ => false,
        }
    }
}

/// One selector with the declarations it sets, in sheet order.
#[derive(Debug)]
pub(crate) struct StyleRule<'a> {
    selector: Selector<'a>,
    /// Id, class and element counts, compared in that order.
    pub specificity: [u16; 3],
    pub declarations: Vec<(&'a str, &'a str)>,
}

impl StyleRule<'_> {
    pub fn matches(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.selector.matches(&XmlElement(node))
    }
}

/// An `@font-face` rule whose source is an SVG font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SvgFontFace {
    pub family: String,
    pub url: String,
}

/// Comment-free sheet text, kept alive for the rules that borrow it.
pub(crate) fn prepare(css: &str) -> String {
    strip_css_comments(css)
}

pub(crate) fn parse_rules(css: &str) -> Vec<StyleRule<'_>> {
    StyleSheet::parse(css)
        .rules
        .into_iter()
        .map(|rule| {
            StyleRule {
                specificity: rule.selector.specificity().map(u16::from),
                declarations: rule
                    .declarations
                    .iter()
                    .map(|declaration| (declaration.name, declaration.value))
                    .collect(),
                selector: rule.selector,
            }
        })
        .collect()
}

pub(crate) fn parse_font_faces(css: &str) -> Vec<SvgFontFace> {
    let mut faces = Vec::new();
    for caps in FONT_FACE_RE.captures_iter(css) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        let mut family = None;
        let mut sources = "";
        for declaration in DeclarationTokenizer::from(body.as_str()) {
            match declaration.name {
                "font-family" => family = Some(declaration.value.replace(['"', '\''], "")),
                "src" => sources = declaration.value,
                _ => {}
            }
        }
        let Some(family) = family else {
            continue;
        };
        for source in sources.split(',') {
            let is_svg = source.contains("format(\"svg\")") || source.contains("format('svg')");
            if let Some(url) = parse_external_url(source).filter(|_| is_svg) {
                faces.push(SvgFontFace {
                    family: family.trim().to_string(),
                    url: url.trim_matches(['"', '\'']).to_string(),
                });
            }
        }
    }
    faces
}

/// `name: value` pairs of a `style` attribute.
pub(crate) fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    DeclarationTokenizer::from(style)
        .map(|declaration| (declaration.name.to_string(), declaration.value.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_carry_specificity() {
        let rules = parse_rules("#a { fill: red } .b rect { stroke: blue; stroke-width: 2 }");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].specificity, [1, 0, 0]);
        assert_eq!(rules[1].specificity, [0, 1, 1]);
        assert_eq!(rules[1].declarations, vec![("stroke", "blue"), ("stroke-width", "2")]);
    }

    #[test]
    fn test_selector_matching() {
        let xml = roxmltree::Document::parse(
            "<svg><g class='b c'><rect id='r'/><circle/></g></svg>",
        )
        .unwrap();
        let rect = xml
            .descendants()
            .find(|node| node.attribute("id") == Some("r"))
            .unwrap();
        let rules = parse_rules(".c > rect:first-child { fill: red } circle { fill: blue }");
        assert!(rules[0].matches(rect));
        assert!(!rules[1].matches(rect));
    }

    #[test]
    fn test_svg_font_faces() {
        let css = prepare(
            "/* fonts */ @font-face { font-family: 'Shapes'; src: url('fonts/shapes.svg#s') format(\"svg\"), url(a.woff) format(\"woff\") }",
        );
        assert_eq!(
            parse_font_faces(&css),
            vec![SvgFontFace {
                family: "Shapes".to_string(),
                url: "fonts/shapes.svg#s".to_string()
            }]
        );
    }

    #[test]
    fn test_inline_style_keeps_urls_with_semicolons() {
        let styles = parse_inline_style("fill: url(#g); stroke:red ;opacity:0.5");
        assert_eq!(
            styles,
            vec![
                ("fill".to_string(), "url(#g)".to_string()),
                ("stroke".to_string(), "red".to_string()),
                ("opacity".to_string(), "0.5".to_string()),
            ]
        );
    }
}
