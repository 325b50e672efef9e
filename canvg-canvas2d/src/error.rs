//! Errors raised while sizing, styling or exporting a raster surface.

use thiserror::Error;

pub type Canvas2dResult<T> = Result<T, Canvas2dError>;

#[derive(Debug, Error)]
pub enum Canvas2dError {
    /// A side is zero or larger than 32767 pixels.
    #[error("Cannot allocate a {width}x{height} surface")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unrecognised CSS font: {0}")]
    InvalidFont(String),

    #[error("Unrecognised CSS color: {0}")]
    InvalidColor(String),

    #[error("Pixel density must be positive, got {0}")]
    InvalidPpi(f32),

    #[error("Could not encode PNG: {0}")]
    Png(#[from] png::EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_rejected_value() {
        let err = Canvas2dError::InvalidDimensions { width: 0, height: 5 };
        assert_eq!(err.to_string(), "Cannot allocate a 0x5 surface");
        assert_eq!(
            Canvas2dError::InvalidPpi(-1.0).to_string(),
            "Pixel density must be positive, got -1"
        );
    }
}
