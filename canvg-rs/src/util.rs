//! String helpers shared by the attribute, style and path parsers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SPACES_RE: Regex = Regex::new(r"[^\S\u{3000}]+").expect("valid regex");
    static ref NUMBER_RE: Regex =
        Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("valid regex");
    static ref COLOR_NUMBER_RE: Regex = Regex::new(r"\d+(\.\d+)?").expect("valid regex");
    static ref EXTERNAL_URL_RE: Regex =
        Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("valid regex");
}

/// Collapses every whitespace run (except ideographic space) to one space.
pub fn compress_spaces(value: &str) -> String {
    SPACES_RE.replace_all(value, " ").into_owned()
}

pub fn trim_left(value: &str) -> &str {
    value.trim_start()
}

pub fn trim_right(value: &str) -> &str {
    value.trim_end()
}

/// Extracts every number in `value`, in order, ignoring separators.
pub fn to_numbers(value: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(value)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Parses the leading float of `value` the way `parseFloat` reads it.
pub fn parse_leading_float(value: &str) -> f64 {
    let trimmed = value.trim_start();
    match NUMBER_RE.find(trimmed) {
        Some(m) if m.start() == 0 => m.as_str().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Rounds float channels of an `rgb()`/`rgba()` string to integers.
///
/// Only the first three numbers (the color channels) are touched; alpha keeps
/// its fraction.
pub fn normalize_color(color: &str) -> String {
    if !color.starts_with("rgb") {
        return color.to_string();
    }
    let mut channels = 3;
    COLOR_NUMBER_RE
        .replace_all(color, |caps: &regex::Captures| {
            let num = &caps[0];
            let is_float = caps.get(1).is_some();
            if channels > 0 {
                channels -= 1;
                if is_float {
                    return format!("{}", num.parse::<f64>().unwrap_or(0.0).round());
                }
            }
            num.to_string()
        })
        .into_owned()
}

/// Pulls the target out of `url(...)`, e.g. in an `@font-face` `src` entry.
pub fn parse_external_url(value: &str) -> Option<String> {
    EXTERNAL_URL_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Strips `/* */` comments from a stylesheet.
pub fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10,20 30", vec![10.0, 20.0, 30.0])]
    #[case("1.5.5", vec![1.5, 0.5])]
    #[case("-1-2", vec![-1.0, -2.0])]
    #[case("1e2 .5e-1", vec![100.0, 0.05])]
    #[case("", vec![])]
    fn test_to_numbers(#[case] input: &str, #[case] expected: Vec<f64>) {
        assert_eq!(to_numbers(input), expected);
    }

    #[test]
    fn test_compress_spaces_keeps_ideographic_space() {
        assert_eq!(compress_spaces("a \n\t b\u{3000}c"), "a b\u{3000}c");
    }

    #[test]
    fn test_normalize_color_rounds_only_channels() {
        assert_eq!(
            normalize_color("rgba(10.6, 20.2, 30.5, 0.5)"),
            "rgba(11, 20, 31, 0.5)"
        );
        assert_eq!(normalize_color("#ff0000"), "#ff0000");
    }

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("12.5px"), 12.5);
        assert!(parse_leading_float("px").is_nan());
    }

    #[test]
    fn test_parse_external_url() {
        assert_eq!(
            parse_external_url(r#"url("fonts/a.svg#f") format("svg")"#).as_deref(),
            Some("fonts/a.svg#f")
        );
    }

    #[test]
    fn test_strip_css_comments() {
        assert_eq!(strip_css_comments("a{/* x */fill:red}"), "a{fill:red}");
    }
}
