//! Markup to [`Document`]: from a string, a URL or file path, or an already
//! parsed XML tree.

use crate::builder;
use crate::document::{Document, DocumentOptions};
use crate::error::{CanvgError, CanvgResult};
use std::path::Path;

/// Parses SVG XML. DTDs are accepted so that entity declarations in
/// exported files resolve.
pub(crate) fn parse_xml(markup: &str) -> CanvgResult<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(markup, options)?)
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: DocumentOptions,
}

impl Parser {
    pub fn new(options: DocumentOptions) -> Self {
        Self { options }
    }

    /// Markup when `source` starts with `<`, otherwise a URL or path to load.
    pub fn parse(&self, source: &str) -> CanvgResult<Document> {
        if source.trim_start().starts_with('<') {
            self.parse_from_string(source)
        } else {
            self.load(source)
        }
    }

    pub fn parse_from_string(&self, markup: &str) -> CanvgResult<Document> {
        let xml = parse_xml(markup)?;
        self.parse_xml(&xml)
    }

    pub fn parse_xml(&self, xml: &roxmltree::Document<'_>) -> CanvgResult<Document> {
        builder::build(xml, self.options.loader(), self.options.navigate.clone())
    }

    /// Fetches and parses `url`. Relative resources of a local file resolve
    /// against its directory unless a base directory is already set.
    pub fn load(&self, url: &str) -> CanvgResult<Document> {
        log::debug!(target: "canvg::parser", "loading {url}");
        let bytes = self.options.loader().fetch_blocking(url)?;
        let markup = String::from_utf8(bytes)
            .map_err(|err| CanvgError::XmlParse(format!("{url} is not UTF-8: {err}")))?;

        let mut options = self.options.clone();
        let is_remote = url.starts_with("http://") || url.starts_with("https://");
        if options.base_dir.is_none() && !is_remote && !url.starts_with("data:") {
            let path = url.strip_prefix("file://").unwrap_or(url);
            options.base_dir = Path::new(path).parent().map(Path::to_path_buf);
        }
        Parser::new(options).parse_from_string(&markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_dispatches_on_leading_bracket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.svg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"<svg xmlns='http://www.w3.org/2000/svg'><rect id='r'/></svg>")
            .unwrap();

        let parser = Parser::default();
        let from_file = parser.parse(path.to_str().unwrap()).unwrap();
        assert!(from_file.get_element_by_id("r").is_some());
        let from_string = parser
            .parse("  <svg xmlns='http://www.w3.org/2000/svg'><g id='g'/></svg>")
            .unwrap();
        assert!(from_string.get_element_by_id("g").is_some());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = Parser::default().load("/no/such/file.svg").unwrap_err();
        assert!(matches!(err, CanvgError::Io(_)));
    }

    #[test]
    fn test_parse_preparsed_tree() {
        let markup = "<svg xmlns='http://www.w3.org/2000/svg'><circle id='c' r='2'/></svg>";
        let xml = roxmltree::Document::parse(markup).unwrap();
        let doc = Parser::default().parse_xml(&xml).unwrap();
        assert_eq!(doc.get_element_by_id("c").unwrap().tag(), "circle");
    }

    #[test]
    fn test_entities_from_dtd() {
        let doc = Document::from_string(
            "<!DOCTYPE svg [<!ENTITY w \"42\">]>\
             <svg xmlns='http://www.w3.org/2000/svg'><rect id='r' width='&w;'/></svg>",
        )
        .unwrap();
        assert_eq!(doc.get_element_by_id("r").unwrap().get_attribute("width").get_number(), 42.0);
    }
}
