//! Image drawing, pixel data, and PNG output operations for Canvas2dContext.

use super::Canvas2dContext;
use crate::error::Canvas2dResult;
use canvg_rs::context::ImageData;
use tiny_skia::Pixmap;

/// Premultiplies straight RGBA into a pixmap with `border` transparent
/// pixels on every side.
pub(crate) fn image_to_pixmap(image: &ImageData, border: u32) -> Option<Pixmap> {
    let expected = image.width as usize * image.height as usize * 4;
    if image.data.len() < expected {
        log::warn!(
            target: "canvas",
            "image data has {} bytes, expected {expected}",
            image.data.len()
        );
        return None;
    }
    let width = image.width + 2 * border;
    let mut pixmap = Pixmap::new(width, image.height + 2 * border)?;
    let pixels = pixmap.pixels_mut();
    for (i, rgba) in image.data[..expected].chunks_exact(4).enumerate() {
        let x = (i as u32 % image.width) + border;
        let y = (i as u32 / image.width) + border;
        pixels[(y * width + x) as usize] =
            tiny_skia::ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
    }
    Some(pixmap)
}

/// Straight alpha from one premultiplied pixel.
fn unpremultiply(pixel: &[u8]) -> [u8; 4] {
    match pixel[3] {
        0 => [0, 0, 0, 0],
        255 => [pixel[0], pixel[1], pixel[2], 255],
        a => {
            let alpha = a as f32 / 255.0;
            let channel = |c: u8| (c as f32 / alpha).round().min(255.0) as u8;
            [channel(pixel[0]), channel(pixel[1]), channel(pixel[2]), a]
        }
    }
}

impl Canvas2dContext {
    /// Draws straight-alpha pixels scaled into the destination rectangle
    /// under the current transform, alpha, composite mode and clip.
    pub fn draw_image(&mut self, image: &ImageData, dx: f32, dy: f32, dw: f32, dh: f32) {
        log::trace!(
            target: "canvas",
            "drawImage {}x{} at {dx} {dy} {dw}x{dh}",
            image.width,
            image.height
        );
        if image.width == 0 || image.height == 0 || dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let Some(pixmap) = image_to_pixmap(image, 0) else {
            return;
        };
        let paint = tiny_skia::PixmapPaint {
            opacity: self.state.global_alpha,
            blend_mode: self.state.global_composite_operation,
            quality: tiny_skia::FilterQuality::Bilinear,
        };
        let transform = self
            .state
            .transform
            .pre_translate(dx, dy)
            .pre_scale(dw / image.width as f32, dh / image.height as f32);

        let mask = self.state.clip_mask.clone();
        self.pixmap
            .draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, mask.as_deref());
    }

    /// Reads a region as straight-alpha RGBA. Pixels outside the canvas
    /// read as transparent black.
    pub fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData {
        let mut image = ImageData::new(width, height);
        let source = self.pixmap.data();

        for row in 0..height {
            let src_y = y + row as i32;
            if src_y < 0 || src_y >= self.height as i32 {
                continue;
            }
            for col in 0..width {
                let src_x = x + col as i32;
                if src_x < 0 || src_x >= self.width as i32 {
                    continue;
                }
                let src_idx = (src_y as usize * self.width as usize + src_x as usize) * 4;
                let dst_idx = (row as usize * width as usize + col as usize) * 4;
                image.data[dst_idx..dst_idx + 4]
                    .copy_from_slice(&unpremultiply(&source[src_idx..src_idx + 4]));
            }
        }
        image
    }

    /// Writes straight-alpha RGBA directly into the canvas, bypassing the
    /// transform, global alpha, compositing and clip. Pixels falling
    /// outside the canvas are dropped.
    pub fn put_image_data(&mut self, image: &ImageData, dx: i32, dy: i32) {
        log::trace!(target: "canvas", "putImageData {}x{} at {dx} {dy}", image.width, image.height);
        let expected = image.width as usize * image.height as usize * 4;
        if image.data.len() < expected {
            return;
        }
        let canvas_width = self.width as i32;
        let canvas_height = self.height as i32;
        let target = self.pixmap.data_mut();

        for row in 0..image.height as i32 {
            let dst_y = dy + row;
            if dst_y < 0 || dst_y >= canvas_height {
                continue;
            }
            for col in 0..image.width as i32 {
                let dst_x = dx + col;
                if dst_x < 0 || dst_x >= canvas_width {
                    continue;
                }
                let src_idx = (row as usize * image.width as usize + col as usize) * 4;
                let dst_idx = (dst_y as usize * canvas_width as usize + dst_x as usize) * 4;
                let [r, g, b, a] = [
                    image.data[src_idx],
                    image.data[src_idx + 1],
                    image.data[src_idx + 2],
                    image.data[src_idx + 3],
                ];
                let premultiplied = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
                target[dst_idx] = premultiplied.red();
                target[dst_idx + 1] = premultiplied.green();
                target[dst_idx + 2] = premultiplied.blue();
                target[dst_idx + 3] = a;
            }
        }
    }

    /// Fills every pixel behind the current content with `color`.
    pub fn fill_background(&mut self, color: &str) -> Canvas2dResult<()> {
        let color = crate::style::parse_css_color(color)?;
        let mut background = Pixmap::new(self.width, self.height).ok_or(
            crate::Canvas2dError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        background.fill(crate::style::skia_color(color, 1.0));
        background.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &tiny_skia::PixmapPaint::default(),
            tiny_skia::Transform::identity(),
            None,
        );
        self.pixmap = background;
        Ok(())
    }

    /// Export the canvas as PNG data.
    ///
    /// `ppi` is written as pixel density metadata and defaults to 72.
    pub fn to_png(&self, ppi: Option<f32>) -> Canvas2dResult<Vec<u8>> {
        let ppi = ppi.unwrap_or(72.0);
        if !ppi.is_finite() || ppi <= 0.0 {
            return Err(crate::Canvas2dError::InvalidPpi(ppi));
        }

        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            // Pixels per meter
            let ppm = (ppi / 0.0254).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));

            let mut writer = encoder.write_header()?;
            let image = self.get_image_data(0, 0, self.width, self.height);
            writer.write_image_data(&image.data)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_canvas;
    use super::*;

    #[test]
    fn test_put_then_get_round_trips_straight_alpha() {
        let mut ctx = test_canvas(4, 4);
        let mut image = ImageData::new(2, 1);
        image.data.copy_from_slice(&[255, 0, 0, 255, 0, 0, 255, 128]);
        ctx.put_image_data(&image, 1, 1);

        let read = ctx.get_image_data(1, 1, 2, 1);
        assert_eq!(read.pixel(0, 0), [255, 0, 0, 255]);
        let [r, g, b, a] = read.pixel(1, 0);
        assert_eq!((r, g, a), (0, 0, 128));
        assert!(b >= 254);
    }

    #[test]
    fn test_put_image_data_ignores_clip_and_alpha() {
        let mut ctx = test_canvas(4, 4);
        ctx.set_global_alpha(0.1);
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 1.0, 1.0);
        ctx.clip_with_rule(canvg_rs::context::FillRule::NonZero);
        let mut image = ImageData::new(1, 1);
        image.data.copy_from_slice(&[0, 255, 0, 255]);
        ctx.put_image_data(&image, 3, 3);
        assert_eq!(ctx.get_image_data(3, 3, 1, 1).pixel(0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn test_get_image_data_outside_is_transparent() {
        let mut ctx = test_canvas(4, 4);
        ctx.fill_rect(0.0, 0.0, 4.0, 4.0);
        let read = ctx.get_image_data(-2, -2, 4, 4);
        assert_eq!(read.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(read.pixel(3, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn test_draw_image_scales_into_destination() {
        let mut ctx = test_canvas(20, 20);
        let mut image = ImageData::new(1, 1);
        image.data.copy_from_slice(&[0, 0, 255, 255]);
        ctx.draw_image(&image, 5.0, 5.0, 10.0, 10.0);
        assert!(ctx.get_image_data(10, 10, 1, 1).pixel(0, 0)[2] > 250);
        assert_eq!(ctx.get_image_data(2, 2, 1, 1).pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_background_goes_behind_content() {
        let mut ctx = test_canvas(4, 4);
        ctx.fill_rect(0.0, 0.0, 2.0, 4.0);
        ctx.fill_background("white").unwrap();
        assert_eq!(ctx.get_image_data(0, 0, 1, 1).pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(ctx.get_image_data(3, 0, 1, 1).pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_to_png_rejects_bad_ppi() {
        let ctx = test_canvas(2, 2);
        assert!(matches!(
            ctx.to_png(Some(0.0)),
            Err(crate::Canvas2dError::InvalidPpi(ppi)) if ppi == 0.0
        ));
        let png = ctx.to_png(Some(144.0)).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
