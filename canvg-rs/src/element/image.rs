//! `<image>`: raster pictures and nested SVG documents.

use super::ElementRef;
use crate::context::{ImageData, RenderingContext};
use crate::document::Document;
use crate::geometry::BoundingBox;
use crate::property::Axis;
use crate::resources::{is_svg_href, Resource, ResourceLoader};
use crate::screen::RenderOptions;
use crate::view_box::ViewBoxParams;
use std::cell::OnceCell;
use std::sync::Arc;

/// What an `<image>` resolved to once its bytes arrived.
#[derive(Debug)]
pub enum DecodedImage {
    Raster(ImageData),
    Svg(Box<Document>),
}

/// The load slot of an `<image>` plus its decoded content, decoded on first
/// render after the bytes arrive.
#[derive(Debug)]
pub struct ImageSource {
    pub(crate) href: String,
    pub(crate) is_svg: bool,
    pub(crate) resource: Arc<Resource>,
    loader: ResourceLoader,
    decoded: OnceCell<Option<DecodedImage>>,
}

impl ImageSource {
    pub(crate) fn load(href: &str, loader: &ResourceLoader) -> Self {
        log::debug!(target: "canvg::resources", "loading image {}", short_href(href));
        Self {
            href: href.to_string(),
            is_svg: is_svg_href(href),
            resource: loader.spawn(href),
            loader: loader.clone(),
            decoded: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }

    /// The decoded image, or `None` while loading or when the bytes were
    /// unusable.
    pub fn decoded(&self) -> Option<&DecodedImage> {
        if !self.is_loaded() {
            return None;
        }
        self.decoded.get_or_init(|| self.decode()).as_ref()
    }

    fn decode(&self) -> Option<DecodedImage> {
        let bytes = self.resource.data()?;
        let decoded = if self.is_svg {
            std::str::from_utf8(&bytes)
                .map_err(|err| crate::error::CanvgError::ImageDecode(err.to_string()))
                .and_then(|markup| Document::from_string_with_loader(markup, self.loader.clone()))
                .map(|document| DecodedImage::Svg(Box::new(document)))
        } else {
            image::load_from_memory(&bytes)
                .map_err(crate::error::CanvgError::from)
                .map(|image| {
                    let rgba = image.to_rgba8();
                    DecodedImage::Raster(ImageData {
                        width: rgba.width(),
                        height: rgba.height(),
                        data: rgba.into_raw(),
                    })
                })
        };
        match decoded {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                log::error!(
                    target: "canvg::resources",
                    "Error while loading image \"{}\": {err}",
                    short_href(&self.href)
                );
                None
            }
        }
    }
}

fn short_href(href: &str) -> &str {
    match href.char_indices().nth(64) {
        Some((end, _)) => &href[..end],
        None => href,
    }
}

fn source<'d>(element: ElementRef<'d>) -> Option<&'d ImageSource> {
    match &element.node().data {
        super::ElementData::Image(source) => Some(source),
        _ => None,
    }
}

pub(crate) fn render(element: ElementRef<'_>, ctx: &mut dyn RenderingContext) {
    let x = element.get_attribute("x").get_pixels(Axis::X);
    let y = element.get_attribute("y").get_pixels(Axis::Y);
    let width = element.get_style("width").get_pixels(Axis::X);
    let height = element.get_style("height").get_pixels(Axis::Y);
    let Some(decoded) = source(element).and_then(ImageSource::decoded) else {
        return;
    };
    if width == 0.0 || height == 0.0 {
        return;
    }

    ctx.save();
    ctx.translate(x, y);
    match decoded {
        DecodedImage::Svg(document) => {
            let options = RenderOptions {
                ignore_dimensions: true,
                ignore_clear: true,
                offset_x: Some(0.0),
                offset_y: Some(0.0),
                scale_width: Some(width),
                scale_height: Some(height),
            };
            document.screen.render(document.root(), ctx, &options);
        }
        DecodedImage::Raster(image) => {
            let aspect_ratio = element.get_attribute("preserveAspectRatio").get_string();
            element.document().set_view_box(
                ctx,
                &ViewBoxParams {
                    aspect_ratio: &aspect_ratio,
                    width,
                    desired_width: f64::from(image.width),
                    height,
                    desired_height: f64::from(image.height),
                    ..Default::default()
                },
            );
            ctx.draw_image(
                image,
                0.0,
                0.0,
                f64::from(image.width),
                f64::from(image.height),
            );
        }
    }
    ctx.restore();
}

pub(crate) fn bounding_box(element: ElementRef<'_>) -> BoundingBox {
    let x = element.get_attribute("x").get_pixels(Axis::X);
    let y = element.get_attribute("y").get_pixels(Axis::Y);
    let width = element.get_style("width").get_pixels(Axis::X);
    let height = element.get_style("height").get_pixels(Axis::Y);
    BoundingBox::new(x, y, x + width, y + height)
}

#[cfg(test)]
mod tests {
    use crate::context::{DrawCall, RecordingContext, RenderingContext};
    use crate::document::Document;
    use crate::geometry::Matrix;
    use base64::Engine;
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32) -> String {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    fn render(svg: &str) -> RecordingContext {
        let doc = Document::from_string(svg).unwrap();
        doc.wait_for_resources();
        let mut ctx = RecordingContext::new(100, 100);
        doc.screen.view_port_mut().set_current(100.0, 100.0);
        doc.root().render(&mut ctx);
        ctx
    }

    #[test]
    fn test_raster_image_is_scaled_into_its_box() {
        let ctx = render(&format!(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <image x='5' y='5' width='40' height='20' href='{}'/></svg>",
            png_data_uri(4, 2)
        ));
        let paints: Vec<_> = ctx.paint_calls().cloned().collect();
        assert_eq!(paints, vec![DrawCall::DrawImage(4, 2, 0.0, 0.0, 4.0, 2.0)]);
        assert_eq!(ctx.stack_depth(), 0);
        assert!(ctx.get_transform().approx_eq(&Matrix::identity(), 1e-9));
    }

    #[test]
    fn test_svg_image_renders_nested_document() {
        let ctx = render(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <image width='50' height='50' \
                 href=\"data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='10' height='10'%3E%3Crect width='10' height='10'/%3E%3C/svg%3E\"/>\
             </svg>",
        );
        assert!(ctx
            .paint_calls()
            .any(|call| matches!(call, DrawCall::Fill(..))));
        assert!(!ctx
            .calls()
            .iter()
            .any(|call| matches!(call, DrawCall::ClearRect(..))));
    }

    #[test]
    fn test_broken_image_draws_nothing() {
        let ctx = render(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <image width='50' height='50' href='data:image/png;base64,AAAA'/></svg>",
        );
        assert_eq!(ctx.paint_calls().count(), 0);
    }

    #[test]
    fn test_image_bounding_box() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <image id='i' x='1' y='2' width='3' height='4'/></svg>",
        )
        .unwrap();
        let mut ctx = RecordingContext::new(10, 10);
        let bbox = doc.get_element_by_id("i").unwrap().get_bounding_box(&mut ctx).unwrap();
        assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (1.0, 2.0, 4.0, 6.0));
    }
}
