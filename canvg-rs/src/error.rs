//! Error types for canvg-rs.

use thiserror::Error;

/// Result type alias using CanvgError.
pub type CanvgResult<T> = Result<T, CanvgError>;

/// Errors that can escape a render.
///
/// Only document construction and resource loading produce errors; everything
/// that goes wrong while drawing degrades visually instead.
#[derive(Debug, Error)]
pub enum CanvgError {
    /// The markup is not well-formed XML.
    #[error("Failed to parse SVG markup: {0}")]
    XmlParse(String),

    /// The parsed document contains a `parsererror` node.
    #[error("Document contains a parser error: {0}")]
    ParserError(String),

    /// The document has no root element the renderer understands.
    #[error("Document has no root element")]
    MissingRoot,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote or local resource could not be fetched.
    #[error("Failed to fetch {0}")]
    Fetch(String),

    /// Raster image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<roxmltree::Error> for CanvgError {
    fn from(err: roxmltree::Error) -> Self {
        CanvgError::XmlParse(err.to_string())
    }
}

impl From<image::ImageError> for CanvgError {
    fn from(err: image::ImageError) -> Self {
        CanvgError::ImageDecode(err.to_string())
    }
}

impl From<reqwest::Error> for CanvgError {
    fn from(err: reqwest::Error) -> Self {
        CanvgError::Fetch(err.to_string())
    }
}
