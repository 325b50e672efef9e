//! Raster drawing surface for `canvg-rs` using tiny-skia and cosmic-text.
//!
//! [`Canvas2dContext`] implements [`canvg_rs::RenderingContext`], so a parsed
//! SVG document can be rendered straight into a pixel buffer. It uses:
//! - `tiny-skia` for paths, paint, clipping and compositing
//! - `cosmic-text` for font shorthand resolution, shaping and glyph outlines
//! - `fontdb` for the font database, configured through [`FontConfig`]
//!
//! # Example
//!
//! ```rust,ignore
//! use canvg_canvas2d::Canvas2dContext;
//! use canvg_rs::{Canvg, CanvgOptions};
//!
//! let ctx = Canvas2dContext::new(400, 300)?;
//! let mut canvg = Canvg::from_string(ctx, "<svg ...>", CanvgOptions::default())?;
//! canvg.render();
//! let png_data = canvg.context().to_png(None)?;
//! ```

mod arc;
mod context;
mod drawing_state;
mod error;
mod font_config;
mod font_parser;
mod style;
mod text;

pub use context::{Canvas2dContext, Canvas2dContextBuilder};
pub use error::{Canvas2dError, Canvas2dResult};
pub use font_config::{font_config_to_fontdb, FontConfig, GenericFamilyMap};
pub use font_parser::{parse_font, ParsedFont};
pub use text::TextMetrics;
