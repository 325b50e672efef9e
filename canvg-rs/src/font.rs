//! The CSS `font` shorthand as the renderer composes it.
//!
//! Only the components the canvas `font` property understands are kept:
//! style, variant, weight, size and family. Line height after `/` is dropped.

use crate::util::compress_spaces;

const STYLES: &[&str] = &["normal", "italic", "oblique", "inherit"];
const VARIANTS: &[&str] = &["normal", "small-caps", "inherit"];
const WEIGHTS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800",
    "900", "inherit",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub font_style: String,
    pub font_variant: String,
    pub font_weight: String,
    pub font_size: String,
    pub font_family: String,
}

impl Font {
    /// Builds a font from explicit components, filling blanks from `inherit`.
    pub fn new(
        font_style: &str,
        font_variant: &str,
        font_weight: &str,
        font_size: &str,
        font_family: &str,
        inherit: Option<&Font>,
    ) -> Self {
        let pick = |own: &str, inherited: Option<&String>| -> String {
            if own.is_empty() {
                inherited.cloned().unwrap_or_default()
            } else {
                own.to_string()
            }
        };
        Self {
            font_style: pick(font_style, inherit.map(|f| &f.font_style)),
            font_variant: pick(font_variant, inherit.map(|f| &f.font_variant)),
            font_weight: pick(font_weight, inherit.map(|f| &f.font_weight)),
            font_size: pick(font_size, inherit.map(|f| &f.font_size)),
            font_family: pick(font_family, inherit.map(|f| &f.font_family)),
        }
    }

    /// Parses a shorthand. Keywords are recognised positionally: once a later
    /// component has been seen, earlier ones can no longer be set.
    pub fn parse(font: &str, inherit: Option<&Font>) -> Font {
        let mut style = String::new();
        let mut variant = String::new();
        let mut weight = String::new();
        let mut size = String::new();
        let mut family: Vec<&str> = Vec::new();

        let (mut style_set, mut variant_set, mut weight_set, mut size_set) =
            (false, false, false, false);

        let normalized = compress_spaces(font);
        for part in normalized.trim().split(' ').filter(|p| !p.is_empty()) {
            if !style_set && STYLES.contains(&part) {
                if part != "inherit" {
                    style = part.to_string();
                }
                style_set = true;
            } else if !variant_set && VARIANTS.contains(&part) {
                if part != "inherit" {
                    variant = part.to_string();
                }
                style_set = true;
                variant_set = true;
            } else if !weight_set && WEIGHTS.contains(&part) {
                if part != "inherit" {
                    weight = part.to_string();
                }
                style_set = true;
                variant_set = true;
                weight_set = true;
            } else if !size_set {
                if part != "inherit" {
                    size = part.split('/').next().unwrap_or_default().to_string();
                }
                style_set = true;
                variant_set = true;
                weight_set = true;
                size_set = true;
            } else if part != "inherit" {
                family.push(part);
            }
        }

        Font::new(&style, &variant, &weight, &size, &family.join(" "), inherit)
    }

    /// The size in pixels when it is a plain px/number value.
    pub fn size_px(&self) -> Option<f64> {
        let value = self.font_size.trim_end_matches("px");
        value.parse::<f64>().ok()
    }
}

fn prepare_font_style(style: &str) -> &str {
    let trimmed = style.trim();
    if trimmed.starts_with("oblique") {
        return "oblique";
    }
    if STYLES.contains(&trimmed) {
        trimmed
    } else {
        ""
    }
}

fn prepare_font_weight(weight: &str) -> &str {
    let trimmed = weight.trim();
    if WEIGHTS.contains(&trimmed) {
        return trimmed;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if (1.0..=1000.0).contains(&n) => trimmed,
        _ => "",
    }
}

/// Quotes family names that need it; generic families stay bare.
fn prepare_font_family(family: &str) -> String {
    family
        .split(',')
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            let unquoted = name.trim_matches(|c| c == '"' || c == '\'');
            if unquoted.contains(' ') || unquoted.chars().any(|c| c.is_ascii_digit()) {
                format!("\"{unquoted}\"")
            } else {
                unquoted.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = [
            prepare_font_style(&self.font_style).to_string(),
            self.font_variant.clone(),
            prepare_font_weight(&self.font_weight).to_string(),
            self.font_size.clone(),
            prepare_font_family(&self.font_family),
        ];
        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12px Arial", "", "", "12px", "Arial")]
    #[case("bold 14px/20px serif", "", "bold", "14px", "serif")]
    #[case("italic small-caps 700 1em Times New Roman", "italic", "700", "1em", "Times New Roman")]
    fn test_parse(
        #[case] input: &str,
        #[case] style: &str,
        #[case] weight: &str,
        #[case] size: &str,
        #[case] family: &str,
    ) {
        let font = Font::parse(input, None);
        assert_eq!(font.font_style, style);
        assert_eq!(font.font_weight, weight);
        assert_eq!(font.font_size, size);
        assert_eq!(font.font_family, family);
    }

    #[test]
    fn test_inherit_fills_blanks() {
        let parent = Font::parse("italic 20px serif", None);
        let font = Font::new("", "", "bold", "", "", Some(&parent));
        assert_eq!(font.to_string(), "italic bold 20px serif");
    }

    #[test]
    fn test_display_quotes_multiword_families() {
        let font = Font::parse("10px Times New Roman", None);
        assert_eq!(font.to_string(), "10px \"Times New Roman\"");
    }

    #[test]
    fn test_size_px() {
        assert_eq!(Font::parse("16px a", None).size_px(), Some(16.0));
        assert_eq!(Font::parse("1em a", None).size_px(), None);
    }
}
