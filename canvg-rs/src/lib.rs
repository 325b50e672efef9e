#![doc = include_str!("../README.md")]

mod builder;
pub mod canvg;
pub mod color;
pub mod context;
mod css;
pub mod document;
pub mod element;
pub mod error;
pub mod filters;
pub mod font;
pub mod geometry;
pub mod parser;
pub mod path_parser;
pub mod property;
pub mod resources;
pub mod scheduler;
pub mod screen;
pub mod transform;
pub mod util;
pub mod view_box;
pub mod view_port;

pub use canvg::{Canvg, CanvgOptions};
pub use context::{DrawCall, Paint, RecordingContext, RenderingContext};
pub use document::{Document, DocumentOptions, NavigateHook};
pub use element::{ElementKind, ElementRef};
pub use error::{CanvgError, CanvgResult};
pub use parser::Parser;
pub use resources::FetchHook;
pub use scheduler::{FrameHandle, FrameScheduler, InstantScheduler, ManualScheduler};
pub use screen::{RenderOptions, FRAMERATE, MAX_SURFACE_SIZE};
