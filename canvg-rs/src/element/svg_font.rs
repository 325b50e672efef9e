//! SVG fonts: `<font>`, `<font-face>`, `<glyph>` and `<missing-glyph>`.

use super::{ElementData, ElementKind, ElementRef, NodeId};
use crate::path_parser::{parse_path_data, PathCommand};
use std::collections::HashMap;

/// Em square used when a font face does not declare `units-per-em`.
pub const DEFAULT_UNITS_PER_EM: f64 = 1000.0;

#[derive(Debug, Clone, Default)]
pub struct GlyphData {
    pub commands: Vec<PathCommand>,
    /// Zero means "use the font's advance".
    pub horiz_adv_x: f64,
    pub unicode: String,
    pub arabic_form: String,
}

impl GlyphData {
    pub(crate) fn from_element(glyph: ElementRef<'_>) -> Self {
        let missing = glyph.kind() == ElementKind::MissingGlyph;
        Self {
            commands: parse_path_data(&glyph.get_attribute("d").get_string()),
            horiz_adv_x: if missing {
                0.0
            } else {
                glyph.get_attribute("horiz-adv-x").get_number()
            },
            unicode: glyph.get_attribute("unicode").get_string(),
            arabic_form: glyph.get_attribute("arabic-form").get_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum GlyphEntry {
    Single(NodeId),
    /// Contextual forms keyed by `arabic-form`.
    Forms(HashMap<String, NodeId>),
}

#[derive(Debug, Clone)]
pub struct FontData {
    pub family: Option<String>,
    pub horiz_adv_x: f64,
    pub units_per_em: f64,
    pub is_rtl: bool,
    pub is_arabic: bool,
    glyphs: HashMap<String, GlyphEntry>,
    missing_glyph: Option<NodeId>,
}

impl FontData {
    pub(crate) fn from_element(font: ElementRef<'_>) -> Self {
        let mut data = FontData {
            family: None,
            horiz_adv_x: font.get_attribute("horiz-adv-x").get_number(),
            units_per_em: DEFAULT_UNITS_PER_EM,
            is_rtl: false,
            is_arabic: false,
            glyphs: HashMap::new(),
            missing_glyph: None,
        };

        for child in font.children() {
            match child.kind() {
                ElementKind::FontFace => {
                    let family = child.get_style("font-family");
                    if family.has_value() {
                        data.family = Some(family.get_string());
                    }
                    let units = child.get_attribute("units-per-em").get_number();
                    if units > 0.0 {
                        data.units_per_em = units;
                    }
                }
                ElementKind::MissingGlyph => data.missing_glyph = Some(child.id()),
                ElementKind::Glyph => {
                    let unicode = child.get_attribute("unicode").get_string();
                    let arabic_form = child.get_attribute("arabic-form").get_string();
                    if arabic_form.is_empty() {
                        data.glyphs.insert(unicode, GlyphEntry::Single(child.id()));
                        continue;
                    }
                    data.is_rtl = true;
                    data.is_arabic = true;
                    let entry = data
                        .glyphs
                        .entry(unicode)
                        .or_insert_with(|| GlyphEntry::Forms(HashMap::new()));
                    if let GlyphEntry::Single(isolated) = *entry {
                        *entry = GlyphEntry::Forms(HashMap::from([("isolated".to_string(), isolated)]));
                    }
                    if let GlyphEntry::Forms(forms) = entry {
                        forms.insert(arabic_form, child.id());
                    }
                }
                _ => {}
            }
        }
        data
    }

    /// The glyph for `chars[index]`, choosing Arabic contextual forms from
    /// the neighbouring characters, else the missing glyph.
    pub fn glyph_for(&self, chars: &[char], index: usize) -> Option<NodeId> {
        let key = chars.get(index)?.to_string();
        let glyph = match self.glyphs.get(&key) {
            Some(GlyphEntry::Single(id)) => Some(*id),
            Some(GlyphEntry::Forms(forms)) => forms.get(arabic_form(chars, index)).copied(),
            None => None,
        };
        glyph.or(self.missing_glyph)
    }

    /// Horizontal advance of `glyph` in em units.
    pub(crate) fn advance(&self, glyph: ElementRef<'_>) -> f64 {
        let own = match &glyph.node().data {
            ElementData::Glyph(data) => data.horiz_adv_x,
            _ => 0.0,
        };
        if own != 0.0 {
            own
        } else {
            self.horiz_adv_x
        }
    }
}

fn arabic_form(chars: &[char], index: usize) -> &'static str {
    let last = chars.len().saturating_sub(1);
    let prev_is_space = index == 0 || chars[index - 1] == ' ';
    let next_is_space = index == last || chars[index + 1] == ' ';
    let mut form = "isolated";
    if prev_is_space && index < last && !next_is_space {
        form = "terminal";
    }
    if !prev_is_space && !next_is_space {
        form = "medial";
    }
    if !prev_is_space && next_is_space {
        form = "initial";
    }
    form
}

/// The font data of `element` if it is an SVG `<font>`.
pub(crate) fn font_data<'d>(element: ElementRef<'d>) -> Option<&'d FontData> {
    match &element.node().data {
        ElementData::Font(data) => Some(data),
        _ => None,
    }
}
