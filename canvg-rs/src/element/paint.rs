//! Paint servers: linear and radial gradients, gradient stops and patterns.

use super::effects::offscreen_size;
use super::{ElementKind, ElementRef};
use crate::color::Color;
use crate::context::{GradientStop, Paint, RenderingContext, Repetition};
use crate::geometry::BoundingBox;
use crate::property::{Axis, Property};
use crate::transform::Transform;
use std::sync::Arc;

/// Side of the virtual rectangle filled through a transformed gradient.
pub const MAX_VIRTUAL_PIXELS: f64 = 30000.0;

const SHARED_ATTRIBUTES: &[&str] = &["gradientUnits", "gradientTransform"];

/// A gradient plus everything it inherits through its `href` chain.
struct GradientChain<'d> {
    chain: Vec<ElementRef<'d>>,
}

impl<'d> GradientChain<'d> {
    fn new(gradient: ElementRef<'d>) -> Self {
        let mut chain = vec![gradient];
        let mut current = gradient;
        while let Some(next) = current.get_href_attribute().get_definition() {
            if !matches!(
                next.kind(),
                ElementKind::LinearGradient | ElementKind::RadialGradient
            ) || chain.contains(&next)
            {
                break;
            }
            chain.push(next);
            current = next;
        }
        Self { chain }
    }

    fn head(&self) -> ElementRef<'d> {
        self.chain[0]
    }

    /// The first value along the chain. Geometry attributes only inherit
    /// from gradients of the same kind.
    fn attribute(&self, name: &str) -> Property<'d> {
        let head_kind = self.head().kind();
        let shared = SHARED_ATTRIBUTES.contains(&name);
        self.chain
            .iter()
            .filter(|gradient| shared || gradient.kind() == head_kind)
            .map(|gradient| gradient.get_attribute(name))
            .find(Property::has_value)
            .unwrap_or_else(|| self.head().get_attribute(name))
    }

    fn stops(&self) -> Vec<ElementRef<'d>> {
        self.chain
            .iter()
            .map(|gradient| {
                gradient
                    .children()
                    .filter(|child| child.kind() == ElementKind::Stop)
                    .collect::<Vec<_>>()
            })
            .find(|stops| !stops.is_empty())
            .unwrap_or_default()
    }
}

/// A stop's offset in `[0, 1]` and its color with `stop-opacity` folded in.
pub(crate) fn stop_color(stop: ElementRef<'_>) -> (f64, String) {
    let offset = stop.get_attribute("offset").get_number().clamp(0.0, 1.0);
    let opacity = stop.get_style("stop-opacity");
    let mut color = stop.get_style_with("stop-color", true, false);
    match color.get_string().as_str() {
        "" => color.set_value("#000"),
        "currentColor" => {
            let current = stop.get_style("color").get_color_or("black");
            color = Property::new(stop.document(), "stop-color", current);
        }
        _ => {}
    }
    if opacity.has_value() {
        color = color.add_opacity(&opacity);
    }
    (offset, color.get_color())
}

fn with_parent_opacity(document: &crate::document::Document, color: &str, opacity: &Property<'_>) -> Color {
    let value = if opacity.has_value() {
        Property::new(document, "color", color)
            .add_opacity(opacity)
            .get_color()
    } else {
        color.to_string()
    };
    Color::parse(&value).unwrap_or(Color::BLACK)
}

pub(crate) fn create_gradient<'d>(
    gradient: ElementRef<'d>,
    ctx: &mut dyn RenderingContext,
    element: ElementRef<'d>,
    opacity: &Property<'d>,
) -> Option<Paint> {
    let document = gradient.document();
    let chain = GradientChain::new(gradient);
    let stops: Vec<(f64, String)> = chain.stops().into_iter().map(stop_color).collect();
    let Some((_, last_color)) = stops.last() else {
        log::debug!(target: "canvg::render", "gradient without stops");
        return None;
    };

    let bounding_box_units =
        chain.attribute("gradientUnits").get_string_or("objectBoundingBox") == "objectBoundingBox";
    let bbox = if bounding_box_units {
        match element.get_bounding_box(ctx) {
            Some(bbox) => Some(bbox),
            None => return Some(Paint::Color(with_parent_opacity(document, last_color, opacity))),
        }
    } else {
        None
    };

    let gradient_stops: Vec<GradientStop> = stops
        .iter()
        .map(|(offset, color)| GradientStop {
            offset: *offset,
            color: with_parent_opacity(document, color, opacity),
        })
        .collect();

    let paint = match gradient.kind() {
        ElementKind::LinearGradient => linear_gradient(&chain, bbox.as_ref(), gradient_stops),
        _ => radial_gradient(&chain, bbox.as_ref(), gradient_stops),
    };
    let Some(paint) = paint else {
        return Some(Paint::Color(with_parent_opacity(document, last_color, opacity)));
    };

    let gradient_transform = chain.attribute("gradientTransform");
    if !gradient_transform.has_value() {
        return Some(paint);
    }

    let root = document.screen.view_port().root();
    let (width, height) = (
        offscreen_size(root.width.max(1.0)),
        offscreen_size(root.height.max(1.0)),
    );
    let mut offscreen = ctx.create_offscreen(width, height);
    offscreen.set_fill_style(paint);
    Transform::parse(&gradient_transform.get_string()).apply(offscreen.as_mut());
    offscreen.fill_rect(
        -MAX_VIRTUAL_PIXELS / 3.0,
        -MAX_VIRTUAL_PIXELS / 3.0,
        MAX_VIRTUAL_PIXELS,
        MAX_VIRTUAL_PIXELS,
    );
    Some(Paint::Pattern {
        image: Arc::new(offscreen.get_image_data(0, 0, width, height)),
        repetition: Repetition::NoRepeat,
    })
}

/// Resolves a gradient coordinate in bounding-box or user-space units.
fn coordinate(property: &Property<'_>, bbox: Option<&BoundingBox>, axis: Axis) -> f64 {
    match bbox {
        Some(bbox) => match axis {
            Axis::X => bbox.x() + bbox.width() * property.get_number(),
            _ => bbox.y() + bbox.height() * property.get_number(),
        },
        None => property.get_pixels(axis),
    }
}

fn defaulted<'d>(chain: &GradientChain<'d>, name: &str, default: &str) -> Property<'d> {
    let property = chain.attribute(name);
    if property.has_value() {
        property
    } else {
        Property::new(chain.head().document(), name, default)
    }
}

fn linear_gradient(
    chain: &GradientChain<'_>,
    bbox: Option<&BoundingBox>,
    stops: Vec<GradientStop>,
) -> Option<Paint> {
    let x1 = coordinate(&defaulted(chain, "x1", "0%"), bbox, Axis::X);
    let y1 = coordinate(&defaulted(chain, "y1", "0%"), bbox, Axis::Y);
    let x2 = coordinate(&defaulted(chain, "x2", "100%"), bbox, Axis::X);
    let y2 = coordinate(&defaulted(chain, "y2", "0%"), bbox, Axis::Y);
    if x1 == x2 && y1 == y2 {
        return None;
    }
    Some(Paint::LinearGradient {
        x0: x1,
        y0: y1,
        x1: x2,
        y1: y2,
        stops,
    })
}

fn radial_gradient(
    chain: &GradientChain<'_>,
    bbox: Option<&BoundingBox>,
    stops: Vec<GradientStop>,
) -> Option<Paint> {
    let cx = coordinate(&defaulted(chain, "cx", "50%"), bbox, Axis::X);
    let cy = coordinate(&defaulted(chain, "cy", "50%"), bbox, Axis::Y);
    let fx_attr = chain.attribute("fx");
    let fy_attr = chain.attribute("fy");
    let fx = if fx_attr.has_value() {
        coordinate(&fx_attr, bbox, Axis::X)
    } else {
        cx
    };
    let fy = if fy_attr.has_value() {
        coordinate(&fy_attr, bbox, Axis::Y)
    } else {
        cy
    };
    let r_attr = defaulted(chain, "r", "50%");
    let r = match bbox {
        Some(bbox) => (bbox.width() + bbox.height()) / 2.0 * r_attr.get_number(),
        None => r_attr.get_pixels(Axis::Diagonal),
    };
    let fr = chain.attribute("fr").get_pixels(Axis::Diagonal);
    Some(Paint::RadialGradient {
        x0: fx,
        y0: fy,
        r0: fr,
        x1: cx,
        y1: cy,
        r1: r,
        stops,
    })
}

/// Renders a 3x3 block of pattern tiles offscreen and returns the repeating
/// paint. Tiles smaller than one pixel produce no paint.
pub(crate) fn create_pattern<'d>(
    pattern: ElementRef<'d>,
    ctx: &mut dyn RenderingContext,
    _element: ElementRef<'d>,
    opacity: &Property<'d>,
) -> Option<Paint> {
    let wrapper = pattern.virtual_svg()?;
    let width = pattern.get_style("width").get_pixels_with(Axis::X, true);
    let height = pattern.get_style("height").get_pixels_with(Axis::Y, true);
    if width < 1.0 || height < 1.0 {
        log::debug!(target: "canvg::render", "pattern tile {width}x{height} is empty");
        return None;
    }

    wrapper.node().reset();
    let view_box = pattern.get_attribute("viewBox");
    if view_box.has_value() {
        wrapper.set_attribute("viewBox", view_box.value().clone());
    }
    wrapper.set_attribute("width", format!("{width}px"));
    wrapper.set_attribute("height", format!("{height}px"));
    let pattern_transform = pattern.get_attribute("patternTransform");
    if pattern_transform.has_value() {
        wrapper.set_attribute("transform", pattern_transform.value().clone());
    }

    let (tile_width, tile_height) = (offscreen_size(width.floor()), offscreen_size(height.floor()));
    if f64::from(tile_width) < width.floor() || f64::from(tile_height) < height.floor() {
        log::warn!(
            target: "canvg::render",
            "pattern tile {width}x{height} clamped to {tile_width}x{tile_height}"
        );
    }
    let mut offscreen = ctx.create_offscreen(tile_width, tile_height);
    let x = pattern.get_attribute("x");
    let y = pattern.get_attribute("y");
    if x.has_value() && y.has_value() {
        offscreen.translate(x.get_pixels_with(Axis::X, true), y.get_pixels_with(Axis::Y, true));
    }

    if opacity.has_value() {
        pattern.set_style("fill-opacity", opacity.value().clone());
    } else {
        pattern.node().remove_style("fill-opacity");
    }

    for i in -1..=1 {
        for j in -1..=1 {
            offscreen.save();
            wrapper.set_attribute("x", f64::from(i) * f64::from(tile_width));
            wrapper.set_attribute("y", f64::from(j) * f64::from(tile_height));
            wrapper.render(offscreen.as_mut());
            offscreen.restore();
        }
    }

    Some(Paint::Pattern {
        image: Arc::new(offscreen.get_image_data(0, 0, tile_width, tile_height)),
        repetition: Repetition::Repeat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingContext;
    use crate::document::Document;
    use crate::element::effects::MAX_OFFSCREEN_SIZE;

    fn fill_of(svg: &str) -> Option<Paint> {
        fill_in_viewport(svg, 100.0)
    }

    fn fill_in_viewport(svg: &str, size: f64) -> Option<Paint> {
        let doc = Document::from_string(svg).unwrap();
        let mut ctx = RecordingContext::new(100, 100);
        doc.screen.view_port_mut().set_current(size, size);
        let element = doc.get_element_by_id("s").unwrap();
        let fill = element.get_style("fill");
        let opacity = element.get_style("fill-opacity");
        fill.get_fill_style_definition(&mut ctx, element, &opacity)
    }

    #[test]
    fn test_linear_gradient_in_bounding_box_units() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <linearGradient id='g'><stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/></linearGradient>\
               <rect id='s' x='10' y='20' width='100' height='50' fill='url(#g)'/></svg>",
        );
        match paint {
            Some(Paint::LinearGradient { x0, y0, x1, y1, stops }) => {
                assert_eq!((x0, y0, x1, y1), (10.0, 20.0, 110.0, 20.0));
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[1].color, Color::rgb(0, 0, 255));
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_gradient_uses_last_stop() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <linearGradient id='g' x1='0.5' x2='0.5'><stop offset='0' stop-color='red'/><stop offset='1' stop-color='lime'/></linearGradient>\
               <rect id='s' width='10' height='10' fill='url(#g)'/></svg>",
        );
        assert_eq!(paint, Some(Paint::Color(Color::rgb(0, 255, 0))));
    }

    #[test]
    fn test_href_chain_supplies_stops_and_units() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
               <linearGradient id='base' gradientUnits='userSpaceOnUse'><stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/></linearGradient>\
               <linearGradient id='g' xlink:href='#base' x1='0' x2='50'/>\
               <rect id='s' width='10' height='10' fill='url(#g)'/></svg>",
        );
        match paint {
            Some(Paint::LinearGradient { x0, x1, stops, .. }) => {
                assert_eq!((x0, x1), (0.0, 50.0));
                assert_eq!(stops.len(), 2);
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn test_radial_gradient_defaults() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <radialGradient id='g'><stop offset='0' stop-color='red' stop-opacity='0.5'/></radialGradient>\
               <rect id='s' width='20' height='20' fill='url(#g)'/></svg>",
        );
        match paint {
            Some(Paint::RadialGradient { x0, y0, r0, x1, y1, r1, stops }) => {
                assert_eq!((x0, y0, r0, x1, y1, r1), (10.0, 10.0, 0.0, 10.0, 10.0, 10.0));
                assert!((stops[0].color.a - 0.5).abs() < 1e-6);
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn test_stop_offsets_clamp_and_color_defaults() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'><linearGradient><stop id='s' offset='1.5'/></linearGradient></svg>",
        )
        .unwrap();
        let (offset, color) = stop_color(doc.get_element_by_id("s").unwrap());
        assert_eq!(offset, 1.0);
        assert_eq!(color, "#000");
    }

    #[test]
    fn test_pattern_paint_repeats() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <pattern id='p' width='4' height='4' patternUnits='userSpaceOnUse'><rect width='2' height='2'/></pattern>\
               <rect id='s' width='10' height='10' fill='url(#p)'/></svg>",
        );
        match paint {
            Some(Paint::Pattern { image, repetition }) => {
                assert_eq!(repetition, Repetition::Repeat);
                assert_eq!((image.width, image.height), (4, 4));
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn test_tiny_pattern_yields_nothing() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <pattern id='p' width='0' height='0'/>\
               <rect id='s' width='10' height='10' fill='url(#p)'/></svg>",
        );
        assert!(paint.is_none());
    }

    #[test]
    fn test_huge_pattern_tile_is_clamped() {
        let paint = fill_of(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <pattern id='p' patternUnits='userSpaceOnUse' width='200000' height='200000'>\
                 <rect width='10' height='10'/></pattern>\
               <rect id='s' width='100' height='100' fill='url(#p)'/></svg>",
        );
        match paint {
            Some(Paint::Pattern { image, .. }) => {
                assert_eq!((image.width, image.height), (MAX_OFFSCREEN_SIZE, MAX_OFFSCREEN_SIZE));
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn test_transformed_gradient_surface_is_clamped() {
        let paint = fill_in_viewport(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <linearGradient id='g' gradientTransform='rotate(45)'>\
                 <stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/></linearGradient>\
               <rect id='s' width='10' height='10' fill='url(#g)'/></svg>",
            200000.0,
        );
        match paint {
            Some(Paint::Pattern { image, repetition }) => {
                assert_eq!(repetition, Repetition::NoRepeat);
                assert_eq!((image.width, image.height), (MAX_OFFSCREEN_SIZE, MAX_OFFSCREEN_SIZE));
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }
}
