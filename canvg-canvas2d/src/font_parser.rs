//! CSS font shorthand parsing.
//!
//! Turns strings like "bold italic 14pt 'Times New Roman', serif" into the
//! components cosmic-text needs.

use crate::error::{Canvas2dError, Canvas2dResult};
use cosmic_text::{Style, Weight};

/// Components of a CSS font shorthand.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFont {
    pub style: Style,
    pub weight: Weight,
    pub small_caps: bool,
    /// Font size in pixels.
    pub size_px: f32,
    /// Font families in order of preference.
    pub families: Vec<String>,
}

impl Default for ParsedFont {
    fn default() -> Self {
        Self {
            style: Style::Normal,
            weight: Weight::NORMAL,
            small_caps: false,
            size_px: 10.0,
            families: vec!["sans-serif".to_string()],
        }
    }
}

/// Parses `[style] [variant] [weight] size[/line-height] family[, family]*`.
///
/// An empty string yields the canvas default of `10px sans-serif`.
pub fn parse_font(font: &str) -> Canvas2dResult<ParsedFont> {
    let mut result = ParsedFont::default();
    let mut remaining = font.trim();
    if remaining.is_empty() {
        return Ok(result);
    }

    // Style, variant and weight may come in any order before the size.
    loop {
        let token_end = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        let token = &remaining[..token_end];
        match token {
            "normal" | "inherit" => {}
            "italic" => result.style = Style::Italic,
            "oblique" => result.style = Style::Oblique,
            "small-caps" => result.small_caps = true,
            "bold" | "bolder" => result.weight = Weight::BOLD,
            "lighter" => result.weight = Weight::LIGHT,
            _ => match parse_numeric_weight(token) {
                Some(weight) => result.weight = weight,
                None => break,
            },
        }
        remaining = remaining[token_end..].trim_start();
    }

    let (size, rest) = parse_font_size(remaining)?;
    result.size_px = size;
    remaining = rest;

    if let Some(rest) = remaining.strip_prefix('/') {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        remaining = &rest[end..];
    }

    let families = parse_font_families(remaining);
    if !families.is_empty() {
        result.families = families;
    }
    Ok(result)
}

fn parse_numeric_weight(token: &str) -> Option<Weight> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let weight: u16 = token.parse().ok()?;
    (1..=1000).contains(&weight).then_some(Weight(weight))
}

fn parse_font_size(s: &str) -> Canvas2dResult<(f32, &str)> {
    let num_end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if num_end == 0 {
        return Err(Canvas2dError::InvalidFont(format!(
            "Expected font size, got: {s}"
        )));
    }

    let size: f32 = s[..num_end]
        .parse()
        .map_err(|_| Canvas2dError::InvalidFont(format!("Invalid font size: {}", &s[..num_end])))?;
    let rest = &s[num_end..];

    let (multiplier, unit_len) = if rest.starts_with("px") {
        (1.0, 2)
    } else if rest.starts_with("pt") {
        (4.0 / 3.0, 2)
    } else if rest.starts_with("pc") {
        (16.0, 2)
    } else if rest.starts_with("rem") {
        (16.0, 3)
    } else if rest.starts_with("em") {
        (16.0, 2)
    } else if rest.starts_with('%') {
        (16.0 / 100.0, 1)
    } else {
        (1.0, 0)
    };
    Ok((size * multiplier, rest[unit_len..].trim_start()))
}

/// Comma separated family names, quoted or bare.
fn parse_font_families(s: &str) -> Vec<String> {
    s.split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
