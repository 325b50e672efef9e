//! viewBox / preserveAspectRatio mapping of a user-space rectangle onto a
//! viewport.

use crate::context::{FillRule, RenderingContext};
use crate::geometry::{Matrix, Point};
use crate::util::compress_spaces;

/// Inputs to [`compute_view_box`]. `ref_x`/`ref_y` are already in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBoxParams<'a> {
    pub aspect_ratio: &'a str,
    pub width: f64,
    pub desired_width: f64,
    pub height: f64,
    pub desired_height: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub ref_x: Option<f64>,
    pub ref_y: Option<f64>,
    pub clip: bool,
    pub clip_x: f64,
    pub clip_y: f64,
}

impl Default for ViewBoxParams<'_> {
    fn default() -> Self {
        Self {
            aspect_ratio: "",
            width: 0.0,
            desired_width: 0.0,
            height: 0.0,
            desired_height: 0.0,
            min_x: 0.0,
            min_y: 0.0,
            ref_x: None,
            ref_y: None,
            clip: false,
            clip_x: 0.0,
            clip_y: 0.0,
        }
    }
}

/// The resolved mapping, applied in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBoxMapping {
    /// Offset moving the reference point to the origin (markers).
    pub reference: Option<Point>,
    /// Clip rectangle `(x1, y1, x2, y2)` in the pre-scale space.
    pub clip: Option<[f64; 4]>,
    /// Alignment offset inside the viewport.
    pub align: Point,
    pub scale: Point,
    /// Moves the viewBox origin to `(0, 0)`.
    pub origin: Point,
}

impl ViewBoxMapping {
    pub fn apply(&self, ctx: &mut dyn RenderingContext) {
        if let Some(reference) = self.reference {
            ctx.translate(reference.x, reference.y);
        }
        if let Some([x1, y1, x2, y2]) = self.clip {
            ctx.begin_path();
            ctx.move_to(x1, y1);
            ctx.line_to(x2, y1);
            ctx.line_to(x2, y2);
            ctx.line_to(x1, y2);
            ctx.close_path();
            ctx.clip(FillRule::NonZero);
        }
        if self.align.x != 0.0 || self.align.y != 0.0 {
            ctx.translate(self.align.x, self.align.y);
        }
        ctx.scale(self.scale.x, self.scale.y);
        ctx.translate(self.origin.x, self.origin.y);
    }

    /// The mapping as one matrix, ignoring the clip.
    pub fn to_matrix(&self) -> Matrix {
        let reference = self.reference.unwrap_or_default();
        Matrix::translation(reference.x, reference.y)
            .multiply(&Matrix::translation(self.align.x, self.align.y))
            .multiply(&Matrix::scaling(self.scale.x, self.scale.y))
            .multiply(&Matrix::translation(self.origin.x, self.origin.y))
    }
}

pub fn compute_view_box(params: &ViewBoxParams<'_>) -> ViewBoxMapping {
    let normalized = compress_spaces(params.aspect_ratio);
    let normalized = normalized.trim();
    let normalized = normalized.strip_prefix("defer ").unwrap_or(normalized);
    let mut parts = normalized.split(' ').filter(|part| !part.is_empty());
    let align = parts.next().unwrap_or("xMidYMid");
    let meet_or_slice = parts.next().unwrap_or("meet");

    let scale_x = params.width / params.desired_width;
    let scale_y = params.height / params.desired_height;
    let scale_min = scale_x.min(scale_y);
    let scale_max = scale_x.max(scale_y);

    let (mut final_width, mut final_height) = (params.desired_width, params.desired_height);
    match meet_or_slice {
        "meet" => {
            final_width *= scale_min;
            final_height *= scale_min;
        }
        "slice" => {
            final_width *= scale_max;
            final_height *= scale_max;
        }
        _ => {}
    }

    let reference = match (params.ref_x, params.ref_y) {
        (Some(ref_x), Some(ref_y)) => Some(Point::new(-scale_min * ref_x, -scale_min * ref_y)),
        _ => None,
    };

    let clip = params.clip.then(|| {
        [
            scale_min * params.clip_x,
            scale_min * params.clip_y,
            params.width,
            params.height,
        ]
    });

    let mut offset = Point::default();
    if reference.is_none() {
        let meet = meet_or_slice == "meet";
        let slice = meet_or_slice == "slice";
        let fits_y = (meet && scale_min == scale_y) || (slice && scale_max == scale_y);
        let fits_x = (meet && scale_min == scale_x) || (slice && scale_max == scale_x);
        if align.starts_with("xMid") && fits_y {
            offset.x += params.width / 2.0 - final_width / 2.0;
        }
        if align.ends_with("YMid") && fits_x {
            offset.y += params.height / 2.0 - final_height / 2.0;
        }
        if align.starts_with("xMax") && fits_y {
            offset.x += params.width - final_width;
        }
        if align.ends_with("YMax") && fits_x {
            offset.y += params.height - final_height;
        }
    }

    let scale = if align == "none" {
        Point::new(scale_x, scale_y)
    } else if meet_or_slice == "slice" {
        Point::new(scale_max, scale_max)
    } else {
        Point::new(scale_min, scale_min)
    };

    ViewBoxMapping {
        reference,
        clip,
        align: offset,
        scale,
        origin: Point::new(-params.min_x, -params.min_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(aspect_ratio: &str) -> ViewBoxParams<'_> {
        ViewBoxParams {
            aspect_ratio,
            width: 200.0,
            desired_width: 100.0,
            height: 100.0,
            desired_height: 100.0,
            ..Default::default()
        }
    }

    #[rstest]
    #[case("", 1.0, 50.0, 0.0)]
    #[case("xMinYMin meet", 1.0, 0.0, 0.0)]
    #[case("xMaxYMax meet", 1.0, 100.0, 0.0)]
    #[case("xMidYMid slice", 2.0, 0.0, -50.0)]
    #[case("defer xMidYMid", 1.0, 50.0, 0.0)]
    fn test_alignment(
        #[case] aspect_ratio: &str,
        #[case] scale: f64,
        #[case] tx: f64,
        #[case] ty: f64,
    ) {
        let mapping = compute_view_box(&params(aspect_ratio));
        assert_eq!(mapping.scale, Point::new(scale, scale));
        assert_eq!(mapping.align, Point::new(tx, ty));
    }

    #[test]
    fn test_none_scales_axes_independently() {
        let mapping = compute_view_box(&params("none"));
        assert_eq!(mapping.scale, Point::new(2.0, 1.0));
    }

    #[test]
    fn test_meet_maps_view_box_center_to_viewport_center() {
        let mapping = compute_view_box(&ViewBoxParams {
            min_x: 10.0,
            min_y: 20.0,
            ..params("xMidYMid meet")
        });
        let center = mapping.to_matrix().apply_to_point(Point::new(60.0, 70.0));
        assert!((center.x - 100.0).abs() < 1e-9);
        assert!((center.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_point_skips_alignment() {
        let mapping = compute_view_box(&ViewBoxParams {
            ref_x: Some(5.0),
            ref_y: Some(5.0),
            clip: true,
            ..params("")
        });
        assert_eq!(mapping.reference, Some(Point::new(-5.0, -5.0)));
        assert_eq!(mapping.align, Point::default());
        assert_eq!(mapping.clip, Some([0.0, 0.0, 200.0, 100.0]));
    }
}
