//! Fill, stroke, clip, and paint helper operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::style::{fill_rule, skia_color};
use canvg_rs::context::{FillRule, GradientStop, Paint, Repetition};
use std::sync::Arc;
use tiny_skia::Transform;

impl Canvas2dContext {
    // --- Clipping ---

    /// Intersects the clip region with the current path. The path itself
    /// is kept.
    pub fn clip_with_rule(&mut self, rule: FillRule) {
        log::trace!(target: "canvas", "clip {rule:?}");
        let Some(path) = self.path_builder.clone().finish() else {
            // Clipping to an empty path hides everything.
            self.state.clip_mask = tiny_skia::Mask::new(self.width, self.height).map(Arc::new);
            return;
        };
        let rule = fill_rule(rule);
        match &mut self.state.clip_mask {
            Some(mask) => {
                Arc::make_mut(mask).intersect_path(&path, rule, true, Transform::identity());
            }
            None => {
                if let Some(mut mask) = tiny_skia::Mask::new(self.width, self.height) {
                    mask.fill_path(&path, rule, true, Transform::identity());
                    self.state.clip_mask = Some(Arc::new(mask));
                }
            }
        }
    }

    // --- Drawing operations ---

    pub fn fill_with_rule(&mut self, rule: FillRule) {
        log::trace!(target: "canvas", "fill {rule:?}");
        // Clone the builder so a following stroke still sees the path.
        let Some(path) = self.path_builder.clone().finish() else {
            return;
        };
        let style = self.state.fill_style.clone();
        self.fill_device_path(&path, &style, fill_rule(rule));
    }

    /// Strokes the current path with the line state in user space, so
    /// non-uniform scales widen lines the way a browser canvas does.
    pub fn stroke(&mut self) {
        log::trace!(target: "canvas", "stroke");
        let Some(path) = self.path_builder.clone().finish() else {
            return;
        };
        let transform = self.state.transform;
        let mut stroke = self.state.stroke();
        let user_path = transform
            .invert()
            .and_then(|inverse| path.clone().transform(inverse));

        let (path, transform) = match user_path {
            Some(user_path) => (user_path, transform),
            None => {
                // Degenerate transform: stroke the device path with widths
                // scaled by the average axis scale.
                let t = &self.state.transform;
                let scale =
                    ((t.sx * t.sx + t.ky * t.ky).sqrt() + (t.kx * t.kx + t.sy * t.sy).sqrt()) / 2.0;
                if scale <= 0.0 {
                    return;
                }
                stroke.width *= scale;
                stroke.dash = if self.state.line_dash.is_empty() {
                    None
                } else {
                    tiny_skia::StrokeDash::new(
                        self.state.line_dash.iter().map(|d| d * scale).collect(),
                        self.state.line_dash_offset * scale,
                    )
                };
                (path, Transform::identity())
            }
        };

        let style = self.state.stroke_style.clone();
        let _ = self.with_paint(&style, |ctx, paint| {
            let mask = ctx.state.clip_mask.clone();
            ctx.pixmap
                .stroke_path(&path, paint, &stroke, transform, mask.as_deref());
        });
    }

    /// Fills a rectangle without touching the current path.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        log::trace!(target: "canvas", "fillRect {x} {y} {width} {height}");
        let Some(path) = self.device_rect(x, y, width, height) else {
            return;
        };
        let style = self.state.fill_style.clone();
        self.fill_device_path(&path, &style, tiny_skia::FillRule::Winding);
    }

    /// Sets pixels inside the rectangle (and the clip) to transparent.
    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        log::trace!(target: "canvas", "clearRect {x} {y} {width} {height}");
        let Some(path) = self.device_rect(x, y, width, height) else {
            return;
        };
        let paint = tiny_skia::Paint {
            blend_mode: tiny_skia::BlendMode::Clear,
            ..Default::default()
        };
        let mask = self.state.clip_mask.clone();
        self.pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            Transform::identity(),
            mask.as_deref(),
        );
    }

    // --- Private paint helpers ---

    fn device_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Option<tiny_skia::Path> {
        let mut pb = tiny_skia::PathBuilder::new();
        let (x0, y0) = self.transform_point(x, y);
        pb.move_to(x0, y0);
        for (px, py) in [(x + width, y), (x + width, y + height), (x, y + height)] {
            let (tx, ty) = self.transform_point(px, py);
            pb.line_to(tx, ty);
        }
        pb.close();
        pb.finish()
    }

    pub(crate) fn fill_device_path(
        &mut self,
        path: &tiny_skia::Path,
        style: &Paint,
        rule: tiny_skia::FillRule,
    ) {
        let _ = self.with_paint(style, |ctx, paint| {
            let mask = ctx.state.clip_mask.clone();
            ctx.pixmap
                .fill_path(path, paint, rule, Transform::identity(), mask.as_deref());
        });
    }

    fn base_paint(&self) -> tiny_skia::Paint<'static> {
        tiny_skia::Paint {
            anti_alias: true,
            blend_mode: self.state.global_composite_operation,
            ..Default::default()
        }
    }

    /// Runs `draw` with a tiny-skia paint for `style`, or returns `None`
    /// when the style cannot paint anything.
    pub(crate) fn with_paint<R>(
        &mut self,
        style: &Paint,
        draw: impl for<'a> FnOnce(&mut Self, &tiny_skia::Paint<'a>) -> R,
    ) -> Option<R> {
        let alpha = self.state.global_alpha;

        match style {
            Paint::Color(color) => {
                let mut paint = self.base_paint();
                paint.set_color(skia_color(*color, alpha));
                Some(draw(self, &paint))
            }
            Paint::LinearGradient {
                x0,
                y0,
                x1,
                y1,
                stops,
            } => {
                let mut paint = self.base_paint();
                paint.shader = tiny_skia::LinearGradient::new(
                    tiny_skia::Point::from_xy(*x0 as f32, *y0 as f32),
                    tiny_skia::Point::from_xy(*x1 as f32, *y1 as f32),
                    skia_stops(stops, alpha)?,
                    tiny_skia::SpreadMode::Pad,
                    self.state.transform,
                )?;
                Some(draw(self, &paint))
            }
            Paint::RadialGradient {
                x0,
                y0,
                x1,
                y1,
                r1,
                stops,
                ..
            } => {
                let mut paint = self.base_paint();
                paint.shader = tiny_skia::RadialGradient::new(
                    tiny_skia::Point::from_xy(*x0 as f32, *y0 as f32),
                    tiny_skia::Point::from_xy(*x1 as f32, *y1 as f32),
                    *r1 as f32,
                    skia_stops(stops, alpha)?,
                    tiny_skia::SpreadMode::Pad,
                    self.state.transform,
                )?;
                Some(draw(self, &paint))
            }
            Paint::Pattern { image, repetition } => {
                // A transparent border plus pad spread keeps no-repeat tiles
                // from smearing their edge pixels.
                let border = match repetition {
                    Repetition::Repeat => 0,
                    Repetition::NoRepeat => 1,
                };
                let tile = super::image_ops::image_to_pixmap(image, border)?;
                let spread = match repetition {
                    Repetition::Repeat => tiny_skia::SpreadMode::Repeat,
                    Repetition::NoRepeat => tiny_skia::SpreadMode::Pad,
                };
                let offset = -(border as f32);
                let mut paint = self.base_paint();
                paint.shader = tiny_skia::Pattern::new(
                    tile.as_ref(),
                    spread,
                    tiny_skia::FilterQuality::Bilinear,
                    alpha,
                    self.state.transform.pre_translate(offset, offset),
                );
                Some(draw(self, &paint))
            }
        }
    }
}

fn skia_stops(stops: &[GradientStop], alpha: f32) -> Option<Vec<tiny_skia::GradientStop>> {
    if stops.is_empty() {
        return None;
    }
    Some(
        stops
            .iter()
            .map(|stop| {
                tiny_skia::GradientStop::new(stop.offset as f32, skia_color(stop.color, alpha))
            })
            .collect(),
    )
}
