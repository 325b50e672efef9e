//! CSS color values as handed to the drawing surface.

use std::fmt;

/// An sRGB color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parses any CSS color syntax; `None` for keywords like `none` or
    /// `inherit` and for garbage.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        if value.is_empty() || matches!(value, "none" | "inherit" | "currentColor") {
            return None;
        }
        let parsed = csscolorparser::parse(value).ok()?;
        let [r, g, b, a] = parsed.to_array();
        Some(Color {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: (a as f64).clamp(0.0, 1.0),
        })
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn to_rgba_string(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Color {
    /// Serializes like a canvas does: hex when opaque, `rgba()` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            f.write_str(&self.to_rgba_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(Color::parse("red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::parse("#00f"), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_parse_rgba() {
        let color = Color::parse("rgba(10, 20, 30, 0.5)").unwrap();
        assert_eq!((color.r, color.g, color.b), (10, 20, 30));
        assert!((color.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_keywords() {
        assert_eq!(Color::parse("none"), None);
        assert_eq!(Color::parse("inherit"), None);
        assert_eq!(Color::parse(""), None);
    }

    #[test]
    fn test_display_matches_canvas_serialization() {
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "#ff0000");
        assert_eq!(Color::rgba(1, 2, 3, 0.25).to_string(), "rgba(1, 2, 3, 0.25)");
    }
}
